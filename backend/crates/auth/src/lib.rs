//! Storefront Authentication Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases and policies (sign-in, sessions, CSRF, lockout, access)
//! - `infra/` - PostgreSQL and in-memory repository implementations
//! - `presentation/` - HTTP handlers and middleware
//!
//! ## Security Model
//! - Sessions are opaque server-side records; the cookie carries only a random UUID
//! - The session id is rotated on every successful login (fixation defense)
//! - State-changing requests require the per-session CSRF token, compared in constant time
//! - Five failed logins lock the account for thirty minutes; responses never
//!   reveal whether an email exists
//! - Role checks are an explicit table, not a numeric comparison

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult, OptionExt, ResultExt},
    kind::ErrorKind,
};
