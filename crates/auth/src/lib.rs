//! `storekeep-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, Principal, authorize};
pub use password::PasswordHash;
pub use permissions::Permission;
pub use roles::Role;
pub use user::{BOOTSTRAP_ADMIN, NewUser, User, UserProfile, UserUpdate};
