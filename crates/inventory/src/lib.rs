//! Inventory domain module.
//!
//! This crate contains business rules for the store ledger, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage). Items are the
//! only stateful aggregate; receipts and issues are the immutable facts their
//! stock movements produce.

pub mod item;
pub mod report;
pub mod status;
pub mod transaction;

pub use item::{Item, ItemId, ItemUpdate, NewItem, StockCommand, StockMovement, Tombstone};
pub use report::{ExpiryEntry, ExpiryReport, ItemFilter, SummaryMetrics};
pub use status::{ExpiryBucket, ExpiryStatus, StockStatus};
pub use transaction::{HistoryEntry, Issue, IssueStock, ReceiveStock, Receipt, TransactionId};
