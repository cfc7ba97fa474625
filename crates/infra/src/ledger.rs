//! Inventory ledger service.
//!
//! Owns the working set of items, receipts, issues and tombstones, loaded from
//! a [`RecordStore`] at open time, and runs every stock command through the
//! item aggregate:
//!
//! ```text
//! command
//!   ↓
//! 1. take the write lock, find the item
//!   ↓
//! 2. handle (pure decision, produces movements)
//!   ↓
//! 3. apply to a copy of the item
//!   ↓
//! 4. persist: item row, then the receipt/issue row (compensate on failure)
//!   ↓
//! 5. swap the new state into memory
//! ```
//!
//! The write lock is held across the whole sequence, so two concurrent issues
//! can never both pass the stock check against the same on-hand quantity.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use storekeep_core::{Aggregate, DomainError, position_of};
use storekeep_inventory::report::{critical_items, low_stock_items};
use storekeep_inventory::{
    ExpiryReport, HistoryEntry, Issue, IssueStock, Item, ItemFilter, ItemId, ItemUpdate, NewItem,
    ReceiveStock, Receipt, StockCommand, StockMovement, SummaryMetrics, Tombstone, TransactionId,
};

use crate::store::{Record, RecordStore, StorageError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Default)]
struct LedgerState {
    items: Vec<Item>,
    receipts: Vec<Receipt>,
    issues: Vec<Issue>,
    tombstones: Vec<Tombstone>,
}

impl LedgerState {
    fn position(&self, item_id: &ItemId) -> LedgerResult<usize> {
        position_of(&self.items, item_id)
            .ok_or_else(|| DomainError::not_found(format!("item {item_id}")).into())
    }

    fn is_deleted(&self, item_id: &ItemId) -> bool {
        self.tombstones.iter().any(|t| &t.item_id == item_id)
    }

    fn is_known(&self, item_id: &ItemId) -> bool {
        self.is_deleted(item_id) || position_of(&self.items, item_id).is_some()
    }

    fn history<T: Clone>(&self, records: &[T], item_of: impl Fn(&T) -> &ItemId) -> Vec<HistoryEntry<T>> {
        records
            .iter()
            .map(|r| HistoryEntry {
                record: r.clone(),
                item_deleted: self.is_deleted(item_of(r)),
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct InventoryLedger<S> {
    store: S,
    state: RwLock<LedgerState>,
}

impl<S> InventoryLedger<S>
where
    S: RecordStore,
{
    /// Load every record set from `store`.
    pub fn open(store: S) -> LedgerResult<Self> {
        let state = LedgerState {
            items: store.load_all()?,
            receipts: store.load_all()?,
            issues: store.load_all()?,
            tombstones: store.load_all()?,
        };
        info!(
            items = state.items.len(),
            receipts = state.receipts.len(),
            issues = state.issues.len(),
            tombstones = state.tombstones.len(),
            "inventory ledger opened"
        );
        Ok(Self {
            store,
            state: RwLock::new(state),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| StorageError::Lock("inventory ledger".to_string()).into())
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| StorageError::Lock("inventory ledger".to_string()).into())
    }

    pub fn add_item(&self, new: NewItem, now: DateTime<Utc>) -> LedgerResult<Item> {
        new.validate()?;
        let mut state = self.write()?;

        let taken = state
            .items
            .iter()
            .map(|i| &i.item_id)
            .chain(state.tombstones.iter().map(|t| &t.item_id));
        let item_id = ItemId::generate(&new.category, now.date_naive(), taken)?;
        let item = Item::create(item_id, new, now)?;

        self.store.insert(&item)?;
        state.items.push(item.clone());
        info!(item_id = %item.item_id, quantity = item.quantity, "item added");
        Ok(item)
    }

    /// Correct an item's fields directly. No receipt or issue is logged.
    pub fn edit_item(&self, item_id: &ItemId, update: ItemUpdate) -> LedgerResult<Item> {
        let mut state = self.write()?;
        self.commit(&mut state, item_id, StockCommand::Correct(update))?;
        let idx = state.position(item_id)?;
        let item = state.items[idx].clone();
        info!(item_id = %item_id, quantity = item.quantity, "item corrected");
        Ok(item)
    }

    /// Remove an item, leaving a tombstone. Its receipts and issues stay.
    pub fn delete_item(
        &self,
        item_id: &ItemId,
        deleted_by: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<Tombstone> {
        let mut state = self.write()?;
        let idx = state.position(item_id)?;
        let tombstone = Tombstone::of(&state.items[idx], deleted_by, now);

        self.store.insert(&tombstone)?;
        if let Err(e) = self.store.delete::<Item>(item_id.as_str()) {
            if let Err(undo) = self.store.delete::<Tombstone>(&tombstone.key()) {
                error!(item_id = %item_id, error = %undo, "failed to roll back tombstone");
            }
            return Err(e.into());
        }

        state.items.remove(idx);
        state.tombstones.push(tombstone.clone());
        info!(item_id = %item_id, deleted_by, "item deleted");
        Ok(tombstone)
    }

    pub fn receive_stock(&self, item_id: &ItemId, stock: ReceiveStock) -> LedgerResult<Receipt> {
        let mut state = self.write()?;
        let command = StockCommand::Receive {
            receipt_id: TransactionId::new(),
            stock,
        };
        let movements = self.commit(&mut state, item_id, command)?;
        let receipt = movements
            .into_iter()
            .find_map(|m| match m {
                StockMovement::Received(r) => Some(r),
                _ => None,
            })
            .ok_or_else(|| DomainError::validation("receive produced no receipt"))?;
        info!(
            item_id = %item_id,
            quantity = receipt.quantity,
            total_value = %receipt.total_value,
            "stock received"
        );
        Ok(receipt)
    }

    pub fn issue_stock(&self, item_id: &ItemId, stock: IssueStock) -> LedgerResult<Issue> {
        let mut state = self.write()?;
        let command = StockCommand::Issue {
            issue_id: TransactionId::new(),
            stock,
        };
        let movements = match self.commit(&mut state, item_id, command) {
            Ok(m) => m,
            Err(LedgerError::Domain(e @ DomainError::InsufficientStock { .. })) => {
                warn!(item_id = %item_id, error = %e, "issue rejected");
                return Err(e.into());
            }
            Err(e) => return Err(e),
        };
        let issue = movements
            .into_iter()
            .find_map(|m| match m {
                StockMovement::Issued(i) => Some(i),
                _ => None,
            })
            .ok_or_else(|| DomainError::validation("issue produced no issue record"))?;
        info!(
            item_id = %item_id,
            quantity = issue.quantity,
            department = %issue.department,
            "stock issued"
        );
        Ok(issue)
    }

    /// Decide, persist, then apply one command against one item.
    ///
    /// Storage is written before memory. When the transaction row can't be
    /// written after the item row was, the item row is restored.
    fn commit(
        &self,
        state: &mut LedgerState,
        item_id: &ItemId,
        command: StockCommand,
    ) -> LedgerResult<Vec<StockMovement>> {
        let idx = state.position(item_id)?;
        let before = &state.items[idx];
        let movements = before.handle(&command)?;

        let mut after = before.clone();
        for m in &movements {
            after.apply(m);
        }

        self.store.update(item_id.as_str(), &after)?;
        for m in &movements {
            let written = match m {
                StockMovement::Received(r) => self.store.insert(r),
                StockMovement::Issued(i) => self.store.insert(i),
                StockMovement::Corrected(_) => Ok(()),
            };
            if let Err(e) = written {
                if let Err(undo) = self.store.update(item_id.as_str(), &state.items[idx]) {
                    error!(item_id = %item_id, error = %undo, "failed to roll back item row");
                }
                return Err(e.into());
            }
        }

        state.items[idx] = after;
        for m in &movements {
            match m {
                StockMovement::Received(r) => state.receipts.push(r.clone()),
                StockMovement::Issued(i) => state.issues.push(i.clone()),
                StockMovement::Corrected(_) => {}
            }
        }
        Ok(movements)
    }

    pub fn item(&self, item_id: &ItemId) -> LedgerResult<Item> {
        let state = self.read()?;
        let idx = state.position(item_id)?;
        Ok(state.items[idx].clone())
    }

    pub fn items(&self) -> LedgerResult<Vec<Item>> {
        Ok(self.read()?.items.clone())
    }

    pub fn tombstone(&self, item_id: &ItemId) -> LedgerResult<Option<Tombstone>> {
        Ok(self
            .read()?
            .tombstones
            .iter()
            .find(|t| &t.item_id == item_id)
            .cloned())
    }

    /// Distinct non-empty categories, sorted.
    pub fn categories(&self) -> LedgerResult<Vec<String>> {
        let state = self.read()?;
        let mut categories: Vec<String> = state
            .items
            .iter()
            .map(|i| i.category.clone())
            .filter(|c| !c.is_empty())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    pub fn low_stock_items(&self) -> LedgerResult<Vec<Item>> {
        Ok(low_stock_items(&self.read()?.items))
    }

    pub fn critical_items(&self) -> LedgerResult<Vec<Item>> {
        Ok(critical_items(&self.read()?.items))
    }

    pub fn expiry_report(&self, reference_date: NaiveDate) -> LedgerResult<ExpiryReport> {
        Ok(ExpiryReport::build(&self.read()?.items, reference_date))
    }

    pub fn summary_metrics(&self, reference_date: NaiveDate) -> LedgerResult<SummaryMetrics> {
        let state = self.read()?;
        Ok(SummaryMetrics::compute(&state.items, &state.receipts, reference_date))
    }

    pub fn filter_items(&self, filter: &ItemFilter) -> LedgerResult<Vec<Item>> {
        Ok(filter.apply(&self.read()?.items))
    }

    pub fn receipts(&self) -> LedgerResult<Vec<HistoryEntry<Receipt>>> {
        let state = self.read()?;
        Ok(state.history(&state.receipts, |r| &r.item_id))
    }

    pub fn issues(&self) -> LedgerResult<Vec<HistoryEntry<Issue>>> {
        let state = self.read()?;
        Ok(state.history(&state.issues, |i| &i.item_id))
    }

    /// Receipts for one item, live or deleted.
    pub fn receipts_for(&self, item_id: &ItemId) -> LedgerResult<Vec<HistoryEntry<Receipt>>> {
        let state = self.read()?;
        if !state.is_known(item_id) {
            return Err(DomainError::not_found(format!("item {item_id}")).into());
        }
        let mine: Vec<Receipt> = state
            .receipts
            .iter()
            .filter(|r| &r.item_id == item_id)
            .cloned()
            .collect();
        Ok(state.history(&mine, |r| &r.item_id))
    }

    /// Issues for one item, live or deleted.
    pub fn issues_for(&self, item_id: &ItemId) -> LedgerResult<Vec<HistoryEntry<Issue>>> {
        let state = self.read()?;
        if !state.is_known(item_id) {
            return Err(DomainError::not_found(format!("item {item_id}")).into());
        }
        let mine: Vec<Issue> = state
            .issues
            .iter()
            .filter(|i| &i.item_id == item_id)
            .cloned()
            .collect();
        Ok(state.history(&mine, |i| &i.item_id))
    }
}
