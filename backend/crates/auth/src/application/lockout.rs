//! Lockout Guard
//!
//! Tracks failed-login counters and temporary lock windows per email,
//! backed by the user repository. The guard never resets state on its
//! own; only a successful login (via the session manager) clears it.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::Email;

/// Lockout guard
pub struct LockoutGuard<U>
where
    U: UserRepository,
{
    users: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> LockoutGuard<U>
where
    U: UserRepository,
{
    pub fn new(users: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { users, config }
    }

    /// Record a failed login attempt for `email`.
    ///
    /// The counter increment is atomic at the storage layer; when the
    /// new count reaches the threshold the lock window is set. Unknown
    /// emails are a silent no-op and storage failures are logged, never
    /// surfaced — both would otherwise leak which emails exist.
    pub async fn record_failed_login(&self, email: &Email) {
        let new_count = match self.users.increment_login_attempts(email).await {
            Ok(Some(count)) => count,
            Ok(None) => return,
            Err(e) => {
                e.log();
                tracing::warn!(email = %email, "Failed to record login attempt");
                return;
            }
        };

        if new_count < self.config.lockout_threshold as i32 {
            return;
        }

        let lock_until = Utc::now() + self.config.lockout_duration_chrono();
        let locked = async {
            let user = self.users.fetch_by_email(email).await?;
            if let Some(user) = user {
                self.users
                    .set_lock_until(&user.user_id, Some(lock_until))
                    .await?;
            }
            crate::error::AuthResult::Ok(())
        };

        match locked.await {
            Ok(()) => {
                tracing::warn!(
                    email = %email,
                    attempts = new_count,
                    locked_until = %lock_until,
                    "Account locked after repeated failed logins"
                );
            }
            Err(e) => {
                e.log();
                tracing::warn!(email = %email, "Failed to set account lock");
            }
        }
    }

    /// Whether the account for `email` is currently locked.
    ///
    /// Locked when the window is still open, or when the counter sits
    /// at the threshold with no reset in between. Unknown emails and
    /// storage failures read as not locked: the guard degrades toward
    /// availability, it never corrupts the counter.
    pub async fn is_account_locked(&self, email: &Email) -> bool {
        match self.users.fetch_by_email(email).await {
            Ok(Some(user)) => user.is_locked(self.config.lockout_threshold),
            Ok(None) => false,
            Err(e) => {
                e.log();
                tracing::warn!(email = %email, "Lockout check failed, treating as unlocked");
                false
            }
        }
    }
}
