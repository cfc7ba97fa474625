//! Storage adapter abstraction for the ledger's record sets.
//!
//! The ledger and user directory keep their working set in memory and write
//! through to a [`RecordStore`] on every mutation. Backends only need to
//! persist whole records by key; they know nothing about stock rules.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use storekeep_auth::User;
use storekeep_inventory::{Issue, Item, Receipt, Tombstone};

pub mod csv;
pub mod in_memory;

pub use self::csv::CsvRecordStore;
pub use in_memory::InMemoryRecordStore;

/// The persisted record sets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RecordSet {
    Users,
    Items,
    Receipts,
    Issues,
    Tombstones,
}

impl RecordSet {
    pub fn name(&self) -> &'static str {
        match self {
            RecordSet::Users => "users",
            RecordSet::Items => "items",
            RecordSet::Receipts => "receipts",
            RecordSet::Issues => "issues",
            RecordSet::Tombstones => "tombstones",
        }
    }

    /// Column order as written to flat files, matching the record field order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            RecordSet::Users => &[
                "username", "password", "full_name", "role", "department", "created_at", "created_by",
            ],
            RecordSet::Items => &[
                "item_id",
                "item_name",
                "category",
                "quantity",
                "unit",
                "reorder_level",
                "storage_location",
                "supplier",
                "notes",
                "expiry_date",
                "created_at",
            ],
            RecordSet::Receipts => &[
                "receipt_id",
                "date",
                "item_id",
                "item_name",
                "quantity",
                "unit_cost",
                "total_value",
                "supplier",
                "project_code",
                "reference",
                "received_by",
                "notes",
            ],
            RecordSet::Issues => &[
                "issue_id", "date", "item_id", "item_name", "department", "quantity", "purpose", "issued_by",
                "notes",
            ],
            RecordSet::Tombstones => &["item_id", "item_name", "deleted_at", "deleted_by"],
        }
    }
}

impl core::fmt::Display for RecordSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A storable record: belongs to one set and has a unique string key there.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const SET: RecordSet;

    fn key(&self) -> String;
}

impl Record for Item {
    const SET: RecordSet = RecordSet::Items;

    fn key(&self) -> String {
        self.item_id.to_string()
    }
}

impl Record for Receipt {
    const SET: RecordSet = RecordSet::Receipts;

    fn key(&self) -> String {
        self.receipt_id.to_string()
    }
}

impl Record for Issue {
    const SET: RecordSet = RecordSet::Issues;

    fn key(&self) -> String {
        self.issue_id.to_string()
    }
}

impl Record for User {
    const SET: RecordSet = RecordSet::Users;

    fn key(&self) -> String {
        self.username.clone()
    }
}

impl Record for Tombstone {
    const SET: RecordSet = RecordSet::Tombstones;

    fn key(&self) -> String {
        self.item_id.to_string()
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{set} already has a record with key '{key}'")]
    DuplicateKey { set: RecordSet, key: String },

    #[error("{set} has no record with key '{key}'")]
    MissingKey { set: RecordSet, key: String },

    #[error("lock poisoned: {0}")]
    Lock(String),
}

/// Synchronous, all-or-nothing persistence per call.
///
/// Each call either fully succeeds or returns a [`StorageError`]; there is no
/// partial-write recovery at this layer.
pub trait RecordStore: Send + Sync {
    fn load_all<R: Record>(&self) -> Result<Vec<R>, StorageError>;

    /// Append a record. Fails with `DuplicateKey` if the key is taken.
    fn insert<R: Record>(&self, record: &R) -> Result<(), StorageError>;

    /// Replace the record stored under `key`. Fails with `MissingKey`.
    fn update<R: Record>(&self, key: &str, record: &R) -> Result<(), StorageError>;

    /// Remove the record stored under `key`. Fails with `MissingKey`.
    fn delete<R: Record>(&self, key: &str) -> Result<(), StorageError>;
}

impl<S> RecordStore for Arc<S>
where
    S: RecordStore,
{
    fn load_all<R: Record>(&self) -> Result<Vec<R>, StorageError> {
        (**self).load_all()
    }

    fn insert<R: Record>(&self, record: &R) -> Result<(), StorageError> {
        (**self).insert(record)
    }

    fn update<R: Record>(&self, key: &str, record: &R) -> Result<(), StorageError> {
        (**self).update(key, record)
    }

    fn delete<R: Record>(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete::<R>(key)
    }
}
