//! Typed IDs for auth entities

use kernel::id::{Id, markers};

/// Internal user identifier (UUID v4)
pub type UserId = Id<markers::User>;

/// Opaque session identifier carried by the cookie (UUID v4)
pub type SessionId = Id<markers::Session>;
