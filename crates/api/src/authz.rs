//! API-side permission guard, checked before calling into the services.

use axum::http::StatusCode;
use axum::response::Response;

use storekeep_auth::{Permission, authorize};

use crate::app::errors;
use crate::context::PrincipalContext;

pub fn require(principal: &PrincipalContext, permission: Permission) -> Result<(), Response> {
    authorize(principal.principal(), permission)
        .map_err(|e| errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}
