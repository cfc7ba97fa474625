//! Derived classifications: stock status and expiry buckets.
//!
//! Nothing here is stored. Every classification is recomputed from the item's
//! current quantity / expiry date and the caller-supplied reference date.

use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use storekeep_core::DomainError;

/// Stock level relative to an item's reorder level.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// `quantity > reorder_level`
    Adequate,
    /// `0 < quantity <= reorder_level`
    Low,
    /// `quantity == 0`
    Critical,
}

impl StockStatus {
    pub fn classify(quantity: u32, reorder_level: u32) -> Self {
        if quantity == 0 {
            StockStatus::Critical
        } else if quantity <= reorder_level {
            StockStatus::Low
        } else {
            StockStatus::Adequate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Adequate => "adequate",
            StockStatus::Low => "low",
            StockStatus::Critical => "critical",
        }
    }
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "adequate" => Ok(StockStatus::Adequate),
            "low" => Ok(StockStatus::Low),
            "critical" => Ok(StockStatus::Critical),
            other => Err(DomainError::validation(format!(
                "unknown stock status '{other}' (expected adequate, low or critical)"
            ))),
        }
    }
}

/// Days from `reference` until `expiry` (negative once past).
pub fn days_to_expiry(expiry: NaiveDate, reference: NaiveDate) -> i64 {
    expiry.signed_duration_since(reference).num_days()
}

/// Fixed expiry ranges, by days remaining.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExpiryBucket {
    /// days <= 0
    #[serde(rename = "expired")]
    Expired,
    /// 0 < days <= 30
    #[serde(rename = "due_30")]
    Due30,
    /// 30 < days <= 90
    #[serde(rename = "due_90")]
    Due90,
    /// 90 < days <= 180
    #[serde(rename = "due_180")]
    Due180,
    /// days > 180
    #[serde(rename = "later")]
    Later,
}

impl ExpiryBucket {
    pub const ALL: [ExpiryBucket; 5] = [
        ExpiryBucket::Expired,
        ExpiryBucket::Due30,
        ExpiryBucket::Due90,
        ExpiryBucket::Due180,
        ExpiryBucket::Later,
    ];

    pub fn from_days(days: i64) -> Self {
        match days {
            d if d <= 0 => ExpiryBucket::Expired,
            1..=30 => ExpiryBucket::Due30,
            31..=90 => ExpiryBucket::Due90,
            91..=180 => ExpiryBucket::Due180,
            _ => ExpiryBucket::Later,
        }
    }

    pub fn of(expiry: NaiveDate, reference: NaiveDate) -> Self {
        Self::from_days(days_to_expiry(expiry, reference))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryBucket::Expired => "expired",
            ExpiryBucket::Due30 => "due_30",
            ExpiryBucket::Due90 => "due_90",
            ExpiryBucket::Due180 => "due_180",
            ExpiryBucket::Later => "later",
        }
    }
}

/// Expiry classification used for filtering: a bucket, or no expiry date at all.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ExpiryStatus {
    Bucket(ExpiryBucket),
    NoExpiry,
}

impl ExpiryStatus {
    pub fn of(expiry: Option<NaiveDate>, reference: NaiveDate) -> Self {
        match expiry {
            Some(date) => ExpiryStatus::Bucket(ExpiryBucket::of(date, reference)),
            None => ExpiryStatus::NoExpiry,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryStatus::Bucket(b) => b.as_str(),
            ExpiryStatus::NoExpiry => "no_expiry",
        }
    }
}

impl Serialize for ExpiryStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExpiryStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl From<ExpiryBucket> for ExpiryStatus {
    fn from(value: ExpiryBucket) -> Self {
        ExpiryStatus::Bucket(value)
    }
}

impl FromStr for ExpiryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "no_expiry" {
            return Ok(ExpiryStatus::NoExpiry);
        }
        ExpiryBucket::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .map(ExpiryStatus::Bucket)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unknown expiry status '{s}' (expected expired, due_30, due_90, due_180, later or no_expiry)"
                ))
            })
    }
}
