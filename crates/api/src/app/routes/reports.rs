use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;

use storekeep_auth::Permission;
use storekeep_infra::export::to_csv_bytes;
use storekeep_inventory::{Issue, Receipt};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::require;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/summary", get(summary))
        .route("/low-stock", get(low_stock))
        .route("/critical", get(critical))
        .route("/expiry", get(expiry))
}

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ReportQuery>,
) -> Result<Response, Response> {
    require(&principal, Permission::InventoryRead)?;
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let metrics = services
        .ledger
        .summary_metrics(date)
        .map_err(errors::ledger_error_to_response)?;
    Ok(Json(serde_json::json!({
        "reference_date": date,
        "metrics": metrics,
    }))
    .into_response())
}

pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, Response> {
    require(&principal, Permission::InventoryRead)?;
    let items = services
        .ledger
        .low_stock_items()
        .map_err(errors::ledger_error_to_response)?;
    Ok(Json(items).into_response())
}

pub async fn critical(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, Response> {
    require(&principal, Permission::InventoryRead)?;
    let items = services
        .ledger
        .critical_items()
        .map_err(errors::ledger_error_to_response)?;
    Ok(Json(items).into_response())
}

pub async fn expiry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ReportQuery>,
) -> Result<Response, Response> {
    require(&principal, Permission::InventoryRead)?;
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let report = services
        .ledger
        .expiry_report(date)
        .map_err(errors::ledger_error_to_response)?;
    Ok(Json(report).into_response())
}

/// `GET /exports/{items|receipts|issues}.csv`
pub async fn export_csv(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(file): Path<String>,
) -> Result<Response, Response> {
    require(&principal, Permission::ReportsExport)?;
    let ledger = &services.ledger;

    let bytes = match file.as_str() {
        "items.csv" => ledger.items().and_then(|rows| Ok(to_csv_bytes(&rows)?)),
        "receipts.csv" => ledger.receipts().and_then(|rows| {
            let rows: Vec<Receipt> = rows.into_iter().map(|h| h.record).collect();
            Ok(to_csv_bytes(&rows)?)
        }),
        "issues.csv" => ledger.issues().and_then(|rows| {
            let rows: Vec<Issue> = rows.into_iter().map(|h| h.record).collect();
            Ok(to_csv_bytes(&rows)?)
        }),
        _ => {
            return Err(errors::json_error(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("no export named '{file}'"),
            ));
        }
    }
    .map_err(errors::ledger_error_to_response)?;

    tracing::info!(file = %file, bytes = bytes.len(), by = principal.username(), "csv export");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
