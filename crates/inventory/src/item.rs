use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use storekeep_core::{Aggregate, DomainError, DomainResult, Entity};

use crate::status::{ExpiryBucket, StockStatus, days_to_expiry};
use crate::transaction::{Issue, IssueStock, Receipt, ReceiveStock, TransactionId, non_blank};

/// Stock-keeping unit identifier: `{PREFIX}-{YYYYMMDD}-{SEQ}`.
///
/// Assigned once at creation. The ledger never hands out an id that a live
/// item or a tombstone already carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Next free id for `category` on `date`, given every id already taken.
    ///
    /// Fails only when the day's sequence is exhausted.
    pub fn generate<'a>(
        category: &str,
        date: NaiveDate,
        taken: impl IntoIterator<Item = &'a ItemId>,
    ) -> DomainResult<Self> {
        let stem = format!("{}-{}-", category_prefix(category), date.format("%Y%m%d"));
        let last = taken
            .into_iter()
            .filter_map(|id| id.0.strip_prefix(&stem))
            .filter_map(|seq| seq.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let next = last
            .checked_add(1)
            .ok_or_else(|| DomainError::validation(format!("no item ids left for {stem}*")))?;
        Ok(Self(format!("{stem}{next:04}")))
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

fn category_prefix(category: &str) -> String {
    let mut prefix: String = category
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if prefix.is_empty() {
        return "GEN".to_string();
    }
    while prefix.len() < 3 {
        prefix.push('X');
    }
    prefix
}

/// A stock-keeping unit tracked by the ledger.
///
/// # Invariants
/// - `quantity` never goes negative (enforced by type and by issue checks).
/// - `reorder_level > 0`.
/// - `quantity` only changes through [`StockMovement`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,
    #[serde(rename = "item_name")]
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub quantity: u32,
    #[serde(default)]
    pub unit: String,
    pub reorder_level: u32,
    #[serde(default)]
    pub storage_location: String,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    /// Absent on rows carried over from older flat files.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for creating an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub quantity: u32,
    pub reorder_level: u32,
    #[serde(default)]
    pub storage_location: String,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

impl NewItem {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        if self.reorder_level == 0 {
            return Err(DomainError::validation("reorder level must be greater than zero"));
        }
        Ok(())
    }
}

/// Partial correction of an item's fields.
///
/// `None` leaves a field untouched. For `expiry_date`, `Some(None)` clears it
/// (JSON `null`), while an absent key leaves it as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub reorder_level: Option<u32>,
    #[serde(default)]
    pub storage_location: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub expiry_date: Option<Option<NaiveDate>>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ItemUpdate::default()
    }

    fn validate(&self) -> DomainResult<()> {
        if self.is_empty() {
            return Err(DomainError::validation("no fields to update"));
        }
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        if self.reorder_level == Some(0) {
            return Err(DomainError::validation("reorder level must be greater than zero"));
        }
        Ok(())
    }
}

/// Deleted-item marker. Keeps the id reserved and lets history resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    pub item_id: ItemId,
    pub item_name: String,
    pub deleted_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_by: String,
}

impl Tombstone {
    pub fn of(item: &Item, deleted_by: impl Into<String>, deleted_at: DateTime<Utc>) -> Self {
        Self {
            item_id: item.item_id.clone(),
            item_name: item.name.clone(),
            deleted_at,
            deleted_by: deleted_by.into(),
        }
    }
}

/// Commands that move or correct an item's stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockCommand {
    Receive {
        receipt_id: TransactionId,
        stock: ReceiveStock,
    },
    Issue {
        issue_id: TransactionId,
        stock: IssueStock,
    },
    Correct(ItemUpdate),
}

/// What happened to an item. Receipts and issues are the records to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockMovement {
    Received(Receipt),
    Issued(Issue),
    Corrected(ItemUpdate),
}

impl Item {
    /// Build a fresh item. The caller supplies the id so generation stays with
    /// whoever knows which ids are taken.
    pub fn create(item_id: ItemId, new: NewItem, created_at: DateTime<Utc>) -> DomainResult<Self> {
        new.validate()?;
        Ok(Self {
            item_id,
            name: new.name.trim().to_string(),
            category: new.category.trim().to_string(),
            quantity: new.quantity,
            unit: new.unit.trim().to_string(),
            reorder_level: new.reorder_level,
            storage_location: new.storage_location.trim().to_string(),
            supplier: new.supplier.trim().to_string(),
            notes: new.notes.trim().to_string(),
            expiry_date: new.expiry_date,
            created_at: Some(created_at),
        })
    }

    pub fn stock_status(&self) -> StockStatus {
        StockStatus::classify(self.quantity, self.reorder_level)
    }

    pub fn days_to_expiry(&self, reference: NaiveDate) -> Option<i64> {
        self.expiry_date.map(|d| days_to_expiry(d, reference))
    }

    pub fn expiry_bucket(&self, reference: NaiveDate) -> Option<ExpiryBucket> {
        self.days_to_expiry(reference).map(ExpiryBucket::from_days)
    }

    fn handle_receive(
        &self,
        receipt_id: TransactionId,
        cmd: &ReceiveStock,
    ) -> DomainResult<Vec<StockMovement>> {
        if cmd.quantity == 0 {
            return Err(DomainError::validation("received quantity must be greater than zero"));
        }
        if cmd.unit_cost < Decimal::ZERO {
            return Err(DomainError::validation("unit cost cannot be negative"));
        }
        if self.quantity.checked_add(cmd.quantity).is_none() {
            return Err(DomainError::validation("received quantity overflows stock level"));
        }
        let total_value = Decimal::from(cmd.quantity)
            .checked_mul(cmd.unit_cost)
            .ok_or_else(|| DomainError::validation("receipt value is out of range"))?;

        Ok(vec![StockMovement::Received(Receipt {
            receipt_id,
            date: cmd.date,
            item_id: self.item_id.clone(),
            item_name: self.name.clone(),
            quantity: cmd.quantity,
            unit_cost: cmd.unit_cost,
            total_value,
            supplier: cmd.supplier.trim().to_string(),
            project_code: non_blank(&cmd.project_code),
            reference: non_blank(&cmd.reference),
            received_by: cmd.received_by.trim().to_string(),
            notes: non_blank(&cmd.notes),
        })])
    }

    fn handle_issue(&self, issue_id: TransactionId, cmd: &IssueStock) -> DomainResult<Vec<StockMovement>> {
        if cmd.quantity == 0 {
            return Err(DomainError::validation("issued quantity must be greater than zero"));
        }
        if cmd.department.trim().is_empty() {
            return Err(DomainError::validation("receiving department cannot be empty"));
        }
        if cmd.quantity > self.quantity {
            return Err(DomainError::insufficient_stock(
                self.item_id.as_str(),
                cmd.quantity,
                self.quantity,
            ));
        }

        Ok(vec![StockMovement::Issued(Issue {
            issue_id,
            date: cmd.date,
            item_id: self.item_id.clone(),
            item_name: self.name.clone(),
            department: cmd.department.trim().to_string(),
            quantity: cmd.quantity,
            purpose: non_blank(&cmd.purpose),
            issued_by: cmd.issued_by.trim().to_string(),
            notes: non_blank(&cmd.notes),
        })])
    }

    fn handle_correct(&self, update: &ItemUpdate) -> DomainResult<Vec<StockMovement>> {
        update.validate()?;
        Ok(vec![StockMovement::Corrected(update.clone())])
    }

    fn apply_correction(&mut self, u: &ItemUpdate) {
        let trimmed = |s: &String| s.trim().to_string();
        if let Some(name) = &u.name {
            self.name = trimmed(name);
        }
        if let Some(category) = &u.category {
            self.category = trimmed(category);
        }
        if let Some(unit) = &u.unit {
            self.unit = trimmed(unit);
        }
        if let Some(quantity) = u.quantity {
            self.quantity = quantity;
        }
        if let Some(reorder_level) = u.reorder_level {
            self.reorder_level = reorder_level;
        }
        if let Some(location) = &u.storage_location {
            self.storage_location = trimmed(location);
        }
        if let Some(supplier) = &u.supplier {
            self.supplier = trimmed(supplier);
        }
        if let Some(notes) = &u.notes {
            self.notes = trimmed(notes);
        }
        if let Some(expiry) = u.expiry_date {
            self.expiry_date = expiry;
        }
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.item_id
    }
}

impl Aggregate for Item {
    type Command = StockCommand;
    type Event = StockMovement;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            StockMovement::Received(r) => {
                self.quantity = self.quantity.saturating_add(r.quantity);
            }
            StockMovement::Issued(i) => {
                self.quantity = self.quantity.saturating_sub(i.quantity);
            }
            StockMovement::Corrected(u) => self.apply_correction(u),
        }
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            StockCommand::Receive { receipt_id, stock } => self.handle_receive(*receipt_id, stock),
            StockCommand::Issue { issue_id, stock } => self.handle_issue(*issue_id, stock),
            StockCommand::Correct(update) => self.handle_correct(update),
        }
    }
}
