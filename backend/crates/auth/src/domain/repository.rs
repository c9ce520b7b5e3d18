//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer. Every user operation is single-row atomic;
//! the auth core issues no multi-row transactions itself.

use chrono::{DateTime, Utc};

use crate::domain::entity::{SessionRecord, User};
use crate::domain::value_object::{Email, SessionId, UserId};
use crate::error::AuthResult;

/// User repository trait
///
/// `increment_login_attempts` is the one operation racing across
/// clients; implementations must make the read-modify-write atomic
/// (`UPDATE ... RETURNING` or equivalent) so concurrent failures for
/// the same email cannot skip the lock threshold.
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Find user by email (the login identifier)
    async fn fetch_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Find user by ID
    async fn fetch_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Atomically increment the failure counter for `email`.
    ///
    /// Returns the new counter value, or `None` when no row matches
    /// (unknown emails are not an error).
    async fn increment_login_attempts(&self, email: &Email) -> AuthResult<Option<i32>>;

    /// Reset the failure counter to zero
    async fn reset_login_attempts(&self, user_id: &UserId) -> AuthResult<()>;

    /// Set or clear the lockout expiry
    async fn set_lock_until(
        &self,
        user_id: &UserId,
        until: Option<DateTime<Utc>>,
    ) -> AuthResult<()>;

    /// Stamp the last successful login time with the current time
    async fn update_last_login(&self, user_id: &UserId) -> AuthResult<()>;
}

/// Session store trait
///
/// Injectable server-side session backend: in-memory for tests,
/// Postgres in production.
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    /// Load the record for a session id
    async fn load(&self, id: &SessionId) -> AuthResult<Option<SessionRecord>>;

    /// Create or replace the record for a session id
    async fn save(&self, id: &SessionId, record: &SessionRecord) -> AuthResult<()>;

    /// Delete a session
    async fn delete(&self, id: &SessionId) -> AuthResult<()>;

    /// Re-key an existing record from `old` to `new` (session fixation
    /// defense: same entry, new opaque id)
    async fn rotate(&self, old: &SessionId, new: &SessionId) -> AuthResult<()>;

    /// Remove sessions idle since before `cutoff`; returns the count
    async fn cleanup_expired(&self, cutoff: DateTime<Utc>) -> AuthResult<u64>;
}
