//! Value Object Module

pub mod email;
pub mod ids;
pub mod role;

pub use email::Email;
pub use ids::{SessionId, UserId};
pub use role::Role;
