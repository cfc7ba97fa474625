use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storekeep_auth::UserProfile;
use storekeep_inventory::{
    ExpiryStatus, HistoryEntry, Issue, IssueStock, ItemFilter, Receipt, ReceiveStock, StockStatus,
    Tombstone,
};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Stock receipt form. Who and when default to the caller and today.
#[derive(Debug, Deserialize)]
pub struct ReceiveStockRequest {
    pub quantity: u32,
    pub unit_cost: Decimal,
    #[serde(default)]
    pub supplier: String,
    pub received_by: Option<String>,
    pub date: Option<NaiveDate>,
    pub project_code: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl ReceiveStockRequest {
    pub fn into_command(self, caller: &str, today: NaiveDate) -> ReceiveStock {
        ReceiveStock {
            quantity: self.quantity,
            unit_cost: self.unit_cost,
            supplier: self.supplier,
            received_by: self.received_by.unwrap_or_else(|| caller.to_string()),
            date: self.date.unwrap_or(today),
            project_code: self.project_code,
            reference: self.reference,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IssueStockRequest {
    pub quantity: u32,
    pub department: String,
    pub issued_by: Option<String>,
    pub date: Option<NaiveDate>,
    pub purpose: Option<String>,
    pub notes: Option<String>,
}

impl IssueStockRequest {
    pub fn into_command(self, caller: &str, today: NaiveDate) -> IssueStock {
        IssueStock {
            quantity: self.quantity,
            department: self.department,
            issued_by: self.issued_by.unwrap_or_else(|| caller.to_string()),
            date: self.date.unwrap_or(today),
            purpose: self.purpose,
            notes: self.notes,
        }
    }
}

/// `GET /items` query string.
#[derive(Debug, Default, Deserialize)]
pub struct ItemQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub stock_status: Option<String>,
    pub expiry_status: Option<String>,
    pub date: Option<NaiveDate>,
}

impl ItemQuery {
    pub fn into_filter(self, today: NaiveDate) -> Result<ItemFilter, axum::response::Response> {
        let mut filter = ItemFilter::new(self.date.unwrap_or(today));
        if let Some(search) = self.search.filter(|s| !s.trim().is_empty()) {
            filter = filter.search(search);
        }
        if let Some(category) = self.category.filter(|c| !c.trim().is_empty()) {
            filter = filter.category(category);
        }
        if let Some(status) = self.stock_status {
            let status: StockStatus = status
                .parse()
                .map_err(|e: storekeep_core::DomainError| errors::bad_request(e.to_string()))?;
            filter = filter.stock_status(status);
        }
        if let Some(status) = self.expiry_status {
            let status: ExpiryStatus = status
                .parse()
                .map_err(|e: storekeep_core::DomainError| errors::bad_request(e.to_string()))?;
            filter = filter.expiry_status(status);
        }
        Ok(filter)
    }
}

/// Optional `?date=YYYY-MM-DD` for date-relative reports.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub date: Option<NaiveDate>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct ItemHistoryResponse {
    pub item_id: String,
    pub deleted: Option<Tombstone>,
    pub receipts: Vec<HistoryEntry<Receipt>>,
    pub issues: Vec<HistoryEntry<Issue>>,
}
