//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing records, stock and credential checks). Storage failures belong to
/// the infrastructure layer and are passed through unchanged there.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (empty required field, non-positive quantity...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced item or user does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An issue would drive on-hand quantity below zero.
    #[error("insufficient stock for {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: String,
        requested: u32,
        available: u32,
    },

    /// A unique key is already taken (e.g. username).
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Unknown username or wrong password (deliberately indistinguishable).
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The principal lacks the role required for the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn duplicate(what: impl Into<String>) -> Self {
        Self::Duplicate(what.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn insufficient_stock(item_id: impl Into<String>, requested: u32, available: u32) -> Self {
        Self::InsufficientStock {
            item_id: item_id.into(),
            requested,
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_names_both_quantities() {
        let err = DomainError::insufficient_stock("LAB-20260101-0001", 60, 50);
        let msg = err.to_string();
        assert!(msg.contains("LAB-20260101-0001"));
        assert!(msg.contains("requested 60"));
        assert!(msg.contains("available 50"));
    }

    #[test]
    fn credential_errors_do_not_leak_which_part_failed() {
        assert_eq!(
            DomainError::InvalidCredentials.to_string(),
            "invalid username or password"
        );
    }
}
