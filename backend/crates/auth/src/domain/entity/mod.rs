//! Entity Module

pub mod session;
pub mod user;

pub use session::{Identity, SessionContext, SessionRecord};
pub use user::User;
