use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use uuid::Uuid;

use storekeep_auth::Principal;

use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Resolve the bearer session token to a live user.
pub async fn auth_middleware(
    State(services): State<Arc<AppServices>>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let session = session_token(req.headers())?;

    let username = services
        .sessions
        .lookup(&session, Utc::now())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let user = services
        .users
        .user(&username)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(PrincipalContext::new(
        Principal::of(&user),
        user.full_name,
        session,
    ));

    Ok(next.run(req).await)
}

/// `Authorization: Bearer <uuid>`; anything else is unauthorized.
fn session_token(headers: &HeaderMap) -> Result<Uuid, StatusCode> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .and_then(|t| Uuid::parse_str(t).ok())
        .ok_or(StatusCode::UNAUTHORIZED)
}
