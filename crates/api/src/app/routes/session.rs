use std::sync::Arc;

use axum::{
    Extension, Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use chrono::Utc;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> Result<Response, Response> {
    // Password hashing is CPU-bound; keep it off the async workers.
    let directory = Arc::clone(&services);
    let user = tokio::task::spawn_blocking(move || {
        directory.users.authenticate(&body.username, &body.password)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "login task failed");
        errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "login failed")
    })?
    .map_err(errors::ledger_error_to_response)?;

    let token = services
        .sessions
        .create(&user.username, Utc::now())
        .map_err(errors::storage_error_to_response)?;
    Ok((
        StatusCode::OK,
        Json(dto::LoginResponse {
            token,
            user: user.profile(),
        }),
    )
        .into_response())
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> StatusCode {
    services.sessions.revoke(&principal.session());
    tracing::info!(username = principal.username(), "logout");
    StatusCode::NO_CONTENT
}
