//! Read-only derived views over the current item set.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::item::{Item, ItemId};
use crate::status::{ExpiryBucket, ExpiryStatus, StockStatus};
use crate::transaction::Receipt;

/// Items with `0 < quantity <= reorder_level`. Zero-stock items are critical, not low.
pub fn low_stock_items<'a>(items: impl IntoIterator<Item = &'a Item>) -> Vec<Item> {
    with_status(items, StockStatus::Low)
}

/// Items with `quantity == 0`.
pub fn critical_items<'a>(items: impl IntoIterator<Item = &'a Item>) -> Vec<Item> {
    with_status(items, StockStatus::Critical)
}

fn with_status<'a>(items: impl IntoIterator<Item = &'a Item>, status: StockStatus) -> Vec<Item> {
    items
        .into_iter()
        .filter(|i| i.stock_status() == status)
        .cloned()
        .collect()
}

/// One item's line in the expiry report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiryEntry {
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity: u32,
    pub unit: String,
    pub expiry_date: NaiveDate,
    pub days_to_expiry: i64,
}

/// Items with an expiry date, partitioned into fixed buckets.
///
/// Each bucket is sorted soonest-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiryReport {
    pub reference_date: NaiveDate,
    pub expired: Vec<ExpiryEntry>,
    pub due_30: Vec<ExpiryEntry>,
    pub due_90: Vec<ExpiryEntry>,
    pub due_180: Vec<ExpiryEntry>,
    pub later: Vec<ExpiryEntry>,
}

impl ExpiryReport {
    pub fn build<'a>(items: impl IntoIterator<Item = &'a Item>, reference_date: NaiveDate) -> Self {
        let mut report = Self {
            reference_date,
            expired: Vec::new(),
            due_30: Vec::new(),
            due_90: Vec::new(),
            due_180: Vec::new(),
            later: Vec::new(),
        };

        for item in items {
            let Some(expiry_date) = item.expiry_date else {
                continue;
            };
            let entry = ExpiryEntry {
                item_id: item.item_id.clone(),
                item_name: item.name.clone(),
                quantity: item.quantity,
                unit: item.unit.clone(),
                expiry_date,
                days_to_expiry: crate::status::days_to_expiry(expiry_date, reference_date),
            };
            report.bucket_mut(ExpiryBucket::from_days(entry.days_to_expiry)).push(entry);
        }

        for bucket in ExpiryBucket::ALL {
            report
                .bucket_mut(bucket)
                .sort_by(|a, b| a.days_to_expiry.cmp(&b.days_to_expiry).then_with(|| a.item_id.cmp(&b.item_id)));
        }
        report
    }

    pub fn bucket(&self, bucket: ExpiryBucket) -> &[ExpiryEntry] {
        match bucket {
            ExpiryBucket::Expired => &self.expired,
            ExpiryBucket::Due30 => &self.due_30,
            ExpiryBucket::Due90 => &self.due_90,
            ExpiryBucket::Due180 => &self.due_180,
            ExpiryBucket::Later => &self.later,
        }
    }

    fn bucket_mut(&mut self, bucket: ExpiryBucket) -> &mut Vec<ExpiryEntry> {
        match bucket {
            ExpiryBucket::Expired => &mut self.expired,
            ExpiryBucket::Due30 => &mut self.due_30,
            ExpiryBucket::Due90 => &mut self.due_90,
            ExpiryBucket::Due180 => &mut self.due_180,
            ExpiryBucket::Later => &mut self.later,
        }
    }

    pub fn len(&self) -> usize {
        ExpiryBucket::ALL.iter().map(|b| self.bucket(*b).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dashboard aggregates over the current item set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryMetrics {
    pub total_items: usize,
    pub total_units: u64,
    pub low_stock_count: usize,
    pub critical_count: usize,
    /// Items expiring within 30 days (not yet expired).
    pub expiring_soon_count: usize,
    pub expired_count: usize,
    pub total_receipt_value: Decimal,
}

impl SummaryMetrics {
    pub fn compute<'a>(
        items: impl IntoIterator<Item = &'a Item>,
        receipts: impl IntoIterator<Item = &'a Receipt>,
        reference_date: NaiveDate,
    ) -> Self {
        let mut m = Self {
            total_items: 0,
            total_units: 0,
            low_stock_count: 0,
            critical_count: 0,
            expiring_soon_count: 0,
            expired_count: 0,
            total_receipt_value: Decimal::ZERO,
        };

        for item in items {
            m.total_items += 1;
            m.total_units += u64::from(item.quantity);
            match item.stock_status() {
                StockStatus::Low => m.low_stock_count += 1,
                StockStatus::Critical => m.critical_count += 1,
                StockStatus::Adequate => {}
            }
            match item.expiry_bucket(reference_date) {
                Some(ExpiryBucket::Expired) => m.expired_count += 1,
                Some(ExpiryBucket::Due30) => m.expiring_soon_count += 1,
                _ => {}
            }
        }

        m.total_receipt_value = receipts
            .into_iter()
            .fold(Decimal::ZERO, |acc, r| acc.saturating_add(r.total_value));
        m
    }
}

/// Item list filter. Every set criterion must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFilter {
    /// Case-insensitive substring of the item name or id.
    pub search: Option<String>,
    /// Exact category.
    pub category: Option<String>,
    pub stock_status: Option<StockStatus>,
    pub expiry_status: Option<ExpiryStatus>,
    /// Date expiry statuses are computed against.
    pub reference_date: NaiveDate,
}

impl ItemFilter {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            search: None,
            category: None,
            stock_status: None,
            expiry_status: None,
            reference_date,
        }
    }

    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn stock_status(mut self, status: StockStatus) -> Self {
        self.stock_status = Some(status);
        self
    }

    pub fn expiry_status(mut self, status: ExpiryStatus) -> Self {
        self.expiry_status = Some(status);
        self
    }

    pub fn matches(&self, item: &Item) -> bool {
        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            let hit = item.name.to_lowercase().contains(&needle)
                || item.item_id.as_str().to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &item.category != category {
                return false;
            }
        }
        if let Some(status) = self.stock_status {
            if item.stock_status() != status {
                return false;
            }
        }
        if let Some(status) = self.expiry_status {
            if ExpiryStatus::of(item.expiry_date, self.reference_date) != status {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, items: impl IntoIterator<Item = &'a Item>) -> Vec<Item> {
        items.into_iter().filter(|i| self.matches(i)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::NewItem;
    use crate::transaction::TransactionId;
    use chrono::{Days, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn item(id: &str, name: &str, category: &str, quantity: u32, reorder: u32, expiry: Option<NaiveDate>) -> Item {
        Item::create(
            ItemId::new(id),
            NewItem {
                name: name.to_string(),
                category: category.to_string(),
                unit: "Pcs".to_string(),
                quantity,
                reorder_level: reorder,
                expiry_date: expiry,
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn plus(days: u64) -> NaiveDate {
        today().checked_add_days(Days::new(days)).unwrap()
    }

    fn minus(days: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(days)).unwrap()
    }

    fn stock() -> Vec<Item> {
        vec![
            item("LAB-1", "Nitrile gloves", "Lab", 0, 10, Some(minus(1))),
            item("LAB-2", "Pipette tips", "Lab", 10, 10, Some(plus(15))),
            item("REA-1", "Giemsa stain", "Reagents", 4, 5, Some(plus(60))),
            item("REA-2", "Ethanol 70%", "Reagents", 40, 5, Some(plus(120))),
            item("OFF-1", "A4 paper", "Office", 100, 20, None),
            item("REA-3", "Buffer", "Reagents", 3, 1, Some(plus(400))),
        ]
    }

    #[test]
    fn low_stock_excludes_zero_quantity() {
        let items = stock();
        let low: Vec<_> = low_stock_items(&items).into_iter().map(|i| i.item_id).collect();
        assert_eq!(low, vec![ItemId::new("LAB-2"), ItemId::new("REA-1")]);

        let critical: Vec<_> = critical_items(&items).into_iter().map(|i| i.item_id).collect();
        assert_eq!(critical, vec![ItemId::new("LAB-1")]);
    }

    #[test]
    fn expiry_report_buckets_and_skips_undated_items() {
        let items = stock();
        let report = ExpiryReport::build(&items, today());

        assert_eq!(report.expired.len(), 1);
        assert_eq!(report.expired[0].days_to_expiry, -1);
        assert_eq!(report.due_30[0].item_id, ItemId::new("LAB-2"));
        assert_eq!(report.due_30[0].days_to_expiry, 15);
        assert_eq!(report.due_90[0].item_id, ItemId::new("REA-1"));
        assert_eq!(report.due_180[0].item_id, ItemId::new("REA-2"));
        assert_eq!(report.later[0].item_id, ItemId::new("REA-3"));
        assert_eq!(report.len(), 5);
    }

    #[test]
    fn expiry_report_is_recomputed_for_a_later_reference_date() {
        let items = stock();
        let later = ExpiryReport::build(&items, plus(20));
        assert_eq!(later.bucket(ExpiryBucket::Expired).len(), 2);
        assert!(later.due_30.is_empty());
    }

    #[test]
    fn summary_counts() {
        let items = stock();
        let receipts = vec![Receipt {
            receipt_id: TransactionId::new(),
            date: today(),
            item_id: ItemId::new("LAB-2"),
            item_name: "Pipette tips".to_string(),
            quantity: 4,
            unit_cost: Decimal::new(250, 2),
            total_value: Decimal::new(1000, 2),
            supplier: String::new(),
            project_code: None,
            reference: None,
            received_by: String::new(),
            notes: None,
        }];

        let m = SummaryMetrics::compute(&items, &receipts, today());
        assert_eq!(m.total_items, 6);
        assert_eq!(m.total_units, 157);
        assert_eq!(m.low_stock_count, 2);
        assert_eq!(m.critical_count, 1);
        assert_eq!(m.expiring_soon_count, 1);
        assert_eq!(m.expired_count, 1);
        assert_eq!(m.total_receipt_value, Decimal::new(1000, 2));
    }

    #[test]
    fn empty_inventory_summary_is_all_zero() {
        let m = SummaryMetrics::compute(&Vec::<Item>::new(), &Vec::<Receipt>::new(), today());
        assert_eq!(m.total_items, 0);
        assert_eq!(m.total_units, 0);
        assert_eq!(m.total_receipt_value, Decimal::ZERO);
    }

    #[test]
    fn filter_by_search_is_case_insensitive_over_name_and_id() {
        let items = stock();
        let by_name = ItemFilter::new(today()).search("GLOVES").apply(&items);
        assert_eq!(by_name.len(), 1);

        let by_id = ItemFilter::new(today()).search("rea-").apply(&items);
        assert_eq!(by_id.len(), 3);
    }

    #[test]
    fn filter_criteria_combine() {
        let items = stock();
        let f = ItemFilter::new(today())
            .category("Reagents")
            .stock_status(StockStatus::Low);
        let hits = f.apply(&items);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].item_id, ItemId::new("REA-1"));

        // Category is an exact match.
        assert!(ItemFilter::new(today()).category("reagents").apply(&items).is_empty());
    }

    #[test]
    fn filter_by_expiry_status_including_no_expiry() {
        let items = stock();
        let undated = ItemFilter::new(today())
            .expiry_status(ExpiryStatus::NoExpiry)
            .apply(&items);
        assert_eq!(undated.len(), 1);
        assert_eq!(undated[0].item_id, ItemId::new("OFF-1"));

        let expired = ItemFilter::new(today())
            .expiry_status(ExpiryBucket::Expired.into())
            .apply(&items);
        assert_eq!(expired[0].item_id, ItemId::new("LAB-1"));
    }

    #[test]
    fn blank_search_matches_everything() {
        let items = stock();
        assert_eq!(ItemFilter::new(today()).search("  ").apply(&items).len(), items.len());
    }
}
