//! Stock movement records: receipts (stock in) and issues (stock out).
//!
//! Both are immutable facts. They are only ever created as the result of a
//! successful [`StockCommand`](crate::StockCommand) against an item and carry a
//! snapshot of the item's name at the time of the movement.

use core::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storekeep_core::DomainError;

use crate::item::ItemId;

/// Identifier of a receipt or issue record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
    /// for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TransactionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| DomainError::validation(format!("transaction id: {e}")))?;
        Ok(Self(uuid))
    }
}

/// Input for receiving goods against an existing item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveStock {
    pub quantity: u32,
    pub unit_cost: Decimal,
    pub supplier: String,
    pub received_by: String,
    pub date: NaiveDate,
    pub project_code: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// Input for issuing goods from an existing item to a department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStock {
    pub quantity: u32,
    pub department: String,
    pub issued_by: String,
    pub date: NaiveDate,
    pub purpose: Option<String>,
    pub notes: Option<String>,
}

/// Recorded stock-in transaction.
///
/// `total_value` is always `quantity * unit_cost`; it is stored (the flat
/// files carry the column) but never edited independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Older files have no id column; a fresh one is minted on load.
    #[serde(default)]
    pub receipt_id: TransactionId,
    pub date: NaiveDate,
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_value: Decimal,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub project_code: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub received_by: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Recorded stock-out transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub issue_id: TransactionId,
    pub date: NaiveDate,
    pub item_id: ItemId,
    pub item_name: String,
    #[serde(default)]
    pub department: String,
    pub quantity: u32,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub issued_by: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A transaction as shown in history views.
///
/// `item_deleted` is set when the referenced item has since been removed and
/// only its tombstone remains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry<T> {
    #[serde(flatten)]
    pub record: T,
    pub item_deleted: bool,
}

/// Normalise an optional free-text field: trim, and treat blank as absent.
pub(crate) fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_round_trips_through_display() {
        let id = TransactionId::new();
        let parsed: TransactionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn transaction_id_rejects_garbage() {
        let err = "not-a-uuid".parse::<TransactionId>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn blank_optional_text_is_dropped() {
        assert_eq!(non_blank(&Some("  ".to_string())), None);
        assert_eq!(non_blank(&Some(" PRJ-7 ".to_string())), Some("PRJ-7".to_string()));
        assert_eq!(non_blank(&None), None);
    }
}
