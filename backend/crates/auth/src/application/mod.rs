//! Application Layer
//!
//! Use cases and policies composed from the domain layer: sign-in,
//! session lifecycle, access control, CSRF, and lockout.

pub mod access;
pub mod config;
pub mod csrf;
pub mod lockout;
pub mod session_manager;
pub mod sign_in;

pub use access::{Denial, FORBIDDEN_PATH, LOGIN_PATH, TIMEOUT_PATH};
pub use config::AuthConfig;
pub use lockout::LockoutGuard;
pub use session_manager::AuthSessionManager;
pub use sign_in::SignInUseCase;
