use core::str::FromStr;

use serde::{Deserialize, Serialize};

use storekeep_core::DomainError;

use crate::Permission;

/// Role used for RBAC.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }

    /// Permissions granted by this role.
    ///
    /// Only admins manage users; every authenticated role may work the stores.
    pub fn permissions(&self) -> &'static [Permission] {
        const STAFF: &[Permission] = &[
            Permission::InventoryRead,
            Permission::InventoryWrite,
            Permission::StockMove,
            Permission::ReportsExport,
        ];
        const ADMIN: &[Permission] = &[
            Permission::InventoryRead,
            Permission::InventoryWrite,
            Permission::StockMove,
            Permission::ReportsExport,
            Permission::UsersManage,
        ];
        match self {
            Role::Admin => ADMIN,
            Role::Manager | Role::User => STAFF,
        }
    }

    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "user" => Ok(Role::User),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admin_manages_users() {
        assert!(Role::Admin.grants(Permission::UsersManage));
        assert!(!Role::Manager.grants(Permission::UsersManage));
        assert!(!Role::User.grants(Permission::UsersManage));
        assert!(Role::User.grants(Permission::StockMove));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Manager".parse::<Role>().unwrap(), Role::Manager);
        assert!("root".parse::<Role>().is_err());
    }
}
