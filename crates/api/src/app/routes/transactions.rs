use std::sync::Arc;

use axum::{
    Extension, Json,
    response::{IntoResponse, Response},
};

use storekeep_auth::Permission;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::PrincipalContext;

pub async fn list_receipts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, Response> {
    require(&principal, Permission::InventoryRead)?;
    let receipts = services
        .ledger
        .receipts()
        .map_err(errors::ledger_error_to_response)?;
    Ok(Json(receipts).into_response())
}

pub async fn list_issues(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, Response> {
    require(&principal, Permission::InventoryRead)?;
    let issues = services
        .ledger
        .issues()
        .map_err(errors::ledger_error_to_response)?;
    Ok(Json(issues).into_response())
}
