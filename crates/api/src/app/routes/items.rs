use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use storekeep_auth::Permission;
use storekeep_inventory::{ItemId, ItemUpdate, NewItem};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::require;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item).patch(edit_item).delete(delete_item))
        .route("/:id/receive", post(receive_stock))
        .route("/:id/issue", post(issue_stock))
        .route("/:id/history", get(item_history))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ItemQuery>,
) -> Result<Response, Response> {
    require(&principal, Permission::InventoryRead)?;
    let filter = query.into_filter(Utc::now().date_naive())?;
    let items = services
        .ledger
        .filter_items(&filter)
        .map_err(errors::ledger_error_to_response)?;
    Ok(Json(items).into_response())
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewItem>,
) -> Result<Response, Response> {
    require(&principal, Permission::InventoryWrite)?;
    let item = services
        .ledger
        .add_item(body, Utc::now())
        .map_err(errors::ledger_error_to_response)?;
    Ok((StatusCode::CREATED, Json(item)).into_response())
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    require(&principal, Permission::InventoryRead)?;
    let item = services
        .ledger
        .item(&ItemId::new(id))
        .map_err(errors::ledger_error_to_response)?;
    Ok(Json(item).into_response())
}

pub async fn edit_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<ItemUpdate>,
) -> Result<Response, Response> {
    require(&principal, Permission::InventoryWrite)?;
    let item = services
        .ledger
        .edit_item(&ItemId::new(id), body)
        .map_err(errors::ledger_error_to_response)?;
    Ok(Json(item).into_response())
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    require(&principal, Permission::InventoryWrite)?;
    let tombstone = services
        .ledger
        .delete_item(&ItemId::new(id), principal.username(), Utc::now())
        .map_err(errors::ledger_error_to_response)?;
    Ok(Json(tombstone).into_response())
}

pub async fn receive_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReceiveStockRequest>,
) -> Result<Response, Response> {
    require(&principal, Permission::StockMove)?;
    let command = body.into_command(principal.full_name(), Utc::now().date_naive());
    let receipt = services
        .ledger
        .receive_stock(&ItemId::new(id), command)
        .map_err(errors::ledger_error_to_response)?;
    Ok((StatusCode::CREATED, Json(receipt)).into_response())
}

pub async fn issue_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::IssueStockRequest>,
) -> Result<Response, Response> {
    require(&principal, Permission::StockMove)?;
    let command = body.into_command(principal.full_name(), Utc::now().date_naive());
    let issue = services
        .ledger
        .issue_stock(&ItemId::new(id), command)
        .map_err(errors::ledger_error_to_response)?;
    Ok((StatusCode::CREATED, Json(issue)).into_response())
}

pub async fn item_history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, Response> {
    require(&principal, Permission::InventoryRead)?;
    let item_id = ItemId::new(id);
    let ledger = &services.ledger;
    let history = dto::ItemHistoryResponse {
        item_id: item_id.to_string(),
        deleted: ledger
            .tombstone(&item_id)
            .map_err(errors::ledger_error_to_response)?,
        receipts: ledger
            .receipts_for(&item_id)
            .map_err(errors::ledger_error_to_response)?,
        issues: ledger
            .issues_for(&item_id)
            .map_err(errors::ledger_error_to_response)?,
    };
    Ok(Json(history).into_response())
}
