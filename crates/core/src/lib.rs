//! `storekeep-core`: domain foundation building blocks.
//!
//! Pure domain primitives shared by the inventory and auth crates. No IO.

pub mod aggregate;
pub mod error;

pub use aggregate::{Aggregate, Entity, position_of};
pub use error::{DomainError, DomainResult};
