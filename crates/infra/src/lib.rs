//! Infrastructure layer: storage adapters, ledger and user services, config.

pub mod config;
pub mod export;
pub mod ledger;
pub mod store;
pub mod users;

pub use config::{ConfigError, StorageBackend, StorekeepConfig};
pub use ledger::{InventoryLedger, LedgerError, LedgerResult};
pub use store::{CsvRecordStore, InMemoryRecordStore, Record, RecordSet, RecordStore, StorageError};
pub use users::UserDirectory;
