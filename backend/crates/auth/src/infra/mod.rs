//! Infrastructure Layer
//!
//! Repository implementations: PostgreSQL for production, in-memory
//! for tests and local development.

pub mod memory;
pub mod postgres;

pub use memory::MemoryAuthRepository;
pub use postgres::PgAuthRepository;
