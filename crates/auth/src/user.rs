//! User records and their validation rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storekeep_core::{DomainError, DomainResult, Entity};

use crate::{PasswordHash, Role};

/// Username of the bootstrap administrator. This account can't be deleted.
pub const BOOTSTRAP_ADMIN: &str = "admin";

/// A person allowed to sign in to the stores system.
///
/// Older user tables have no audit columns, hence the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: PasswordHash,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: String,
}

/// What a user looks like to anyone but the authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub department: String,
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: String,
}

/// Input for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub department: String,
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if username.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("username cannot contain whitespace"));
        }
        if self.password.is_empty() {
            return Err(DomainError::validation("password cannot be empty"));
        }
        if self.full_name.trim().is_empty() {
            return Err(DomainError::validation("full name cannot be empty"));
        }
        Ok(())
    }
}

/// Partial user update. `password` is plain text and gets re-hashed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub department: Option<String>,
}

impl UserUpdate {
    pub fn validate(&self) -> DomainResult<()> {
        if *self == UserUpdate::default() {
            return Err(DomainError::validation("no fields to update"));
        }
        if matches!(&self.password, Some(p) if p.is_empty()) {
            return Err(DomainError::validation("password cannot be empty"));
        }
        if matches!(&self.full_name, Some(n) if n.trim().is_empty()) {
            return Err(DomainError::validation("full name cannot be empty"));
        }
        Ok(())
    }
}

impl User {
    /// Build a user from validated input and an already computed hash.
    pub fn register(
        new: &NewUser,
        password: PasswordHash,
        created_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        new.validate()?;
        Ok(Self {
            username: new.username.trim().to_string(),
            password,
            full_name: new.full_name.trim().to_string(),
            role: new.role,
            department: new.department.trim().to_string(),
            created_at: Some(created_at),
            created_by: created_by.into(),
        })
    }

    pub fn is_bootstrap_admin(&self) -> bool {
        self.username == BOOTSTRAP_ADMIN
    }

    /// Apply an update. A new password must already be hashed by the caller.
    pub fn apply_update(&mut self, update: &UserUpdate, password: Option<PasswordHash>) {
        if let Some(hash) = password {
            self.password = hash;
        }
        if let Some(full_name) = &update.full_name {
            self.full_name = full_name.trim().to_string();
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(department) = &update.department {
            self.department = department.trim().to_string();
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            department: self.department.clone(),
            created_at: self.created_at,
            created_by: self.created_by.clone(),
        }
    }
}

impl Entity for User {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.username
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: "s3cret".to_string(),
            full_name: " Ama Mensah ".to_string(),
            role: Role::User,
            department: "Epidemiology".to_string(),
        }
    }

    #[test]
    fn register_trims_and_stamps_audit_fields() {
        let u = User::register(
            &new_user(" ama "),
            PasswordHash::new("s3cret", 2),
            "admin",
            now(),
        )
        .unwrap();
        assert_eq!(u.username, "ama");
        assert_eq!(u.full_name, "Ama Mensah");
        assert_eq!(u.created_by, "admin");
        assert!(u.created_at.is_some());
        assert!(u.password.verify("s3cret"));
    }

    #[test]
    fn register_rejects_bad_input() {
        for bad in [
            NewUser { username: "".to_string(), ..new_user("x") },
            NewUser { username: "two words".to_string(), ..new_user("x") },
            NewUser { password: "".to_string(), ..new_user("x") },
            NewUser { full_name: " ".to_string(), ..new_user("x") },
        ] {
            let err = User::register(&bad, PasswordHash::new("x", 1), "admin", now()).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{bad:?}");
        }
    }

    #[test]
    fn profile_omits_the_password() {
        let u = User::register(&new_user("ama"), PasswordHash::new("s3cret", 1), "admin", now()).unwrap();
        let json = serde_json::to_value(u.profile()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn legacy_rows_without_audit_columns_deserialize() {
        let json = r#"{"username":"admin","password":"ab","full_name":"System Administrator","role":"admin"}"#;
        let u: User = serde_json::from_str(json).unwrap();
        assert!(u.is_bootstrap_admin());
        assert_eq!(u.created_at, None);
        assert_eq!(u.department, "");
    }

    #[test]
    fn update_applies_only_given_fields() {
        let mut u = User::register(&new_user("ama"), PasswordHash::new("s3cret", 1), "admin", now()).unwrap();
        let update = UserUpdate {
            role: Some(Role::Manager),
            ..Default::default()
        };
        update.validate().unwrap();
        u.apply_update(&update, None);
        assert_eq!(u.role, Role::Manager);
        assert_eq!(u.full_name, "Ama Mensah");
        assert!(u.password.verify("s3cret"));
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(UserUpdate::default().validate().is_err());
    }
}
