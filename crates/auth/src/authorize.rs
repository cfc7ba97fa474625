use serde::Serialize;
use thiserror::Error;

use storekeep_core::DomainError;

use crate::{Permission, Role, User};

/// An authenticated identity, as far as authorization decisions care.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    pub fn of(user: &User) -> Self {
        Self::new(user.username.clone(), user.role)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(Permission),
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::forbidden(value.to_string())
    }
}

/// Authorize a principal for one permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: Permission) -> Result<(), AuthzError> {
    if principal.role.grants(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_cannot_manage_users() {
        let p = Principal::new("kofi", Role::Manager);
        assert_eq!(
            authorize(&p, Permission::UsersManage),
            Err(AuthzError::Forbidden(Permission::UsersManage))
        );
        assert!(authorize(&p, Permission::InventoryWrite).is_ok());
    }

    #[test]
    fn authz_errors_become_forbidden_domain_errors() {
        let err: DomainError = AuthzError::Forbidden(Permission::UsersManage).into();
        match err {
            DomainError::Forbidden(msg) => assert!(msg.contains("users.manage")),
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }
}
