use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storekeep_core::DomainError;
use storekeep_infra::{LedgerError, StorageError};

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::Domain(e) => domain_error_to_response(e),
        LedgerError::Storage(e) => storage_error_to_response(e),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::InsufficientStock { .. } => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", message)
        }
        DomainError::Duplicate(_) => json_error(StatusCode::CONFLICT, "duplicate", message),
        DomainError::InvalidCredentials => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", message)
        }
        DomainError::Forbidden(_) => json_error(StatusCode::FORBIDDEN, "forbidden", message),
    }
}

pub fn storage_error_to_response(err: StorageError) -> axum::response::Response {
    tracing::error!(error = %err, "storage failure");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// 400 for a malformed query or path value.
pub fn bad_request(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", message)
}
