use storekeep_auth::{Principal, Role};
use uuid::Uuid;

/// Authenticated identity for a request, inserted by the auth middleware.
///
/// The role is read from the user directory on every request, so role changes
/// and deletions apply to live sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
    full_name: String,
    session: Uuid,
}

impl PrincipalContext {
    pub fn new(principal: Principal, full_name: impl Into<String>, session: Uuid) -> Self {
        Self {
            principal,
            full_name: full_name.into(),
            session,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn username(&self) -> &str {
        &self.principal.username
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn session(&self) -> Uuid {
        self.session
    }
}
