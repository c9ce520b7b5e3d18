//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{Identity, SessionContext, SessionRecord, User};
pub use repository::{SessionStore, UserRepository};
pub use value_object::{Email, Role, SessionId, UserId};
