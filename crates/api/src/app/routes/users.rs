//! Admin-only user management.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use storekeep_auth::{NewUser, Permission, UserProfile, UserUpdate};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::PrincipalContext;

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, Response> {
    require(&principal, Permission::UsersManage)?;
    let users: Vec<UserProfile> = services
        .users
        .list_users()
        .map_err(errors::ledger_error_to_response)?
        .iter()
        .map(|u| u.profile())
        .collect();
    Ok(Json(users).into_response())
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewUser>,
) -> Result<Response, Response> {
    require(&principal, Permission::UsersManage)?;
    let user = services
        .users
        .create_user(principal.principal(), body, Utc::now())
        .map_err(errors::ledger_error_to_response)?;
    Ok((StatusCode::CREATED, Json(user.profile())).into_response())
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(username): Path<String>,
    Json(body): Json<UserUpdate>,
) -> Result<Response, Response> {
    require(&principal, Permission::UsersManage)?;
    let user = services
        .users
        .update_user(principal.principal(), &username, body)
        .map_err(errors::ledger_error_to_response)?;
    Ok(Json(user.profile()).into_response())
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(username): Path<String>,
) -> Result<Response, Response> {
    require(&principal, Permission::UsersManage)?;
    services
        .users
        .delete_user(principal.principal(), &username)
        .map_err(errors::ledger_error_to_response)?;
    services.sessions.revoke_user(&username);
    Ok(StatusCode::NO_CONTENT.into_response())
}
