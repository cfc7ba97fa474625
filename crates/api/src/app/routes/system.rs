use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "username": principal.username(),
        "full_name": principal.full_name(),
        "role": principal.role(),
        "permissions": principal
            .role()
            .permissions()
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>(),
    }))
}
