//! Presentation Layer
//!
//! HTTP surface: DTOs, handlers, middleware, and router assembly.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::AuthAppState;
pub use middleware::{CSRF_HEADER, SessionHandle};
pub use router::{auth_router, auth_router_generic, protect, with_session};
