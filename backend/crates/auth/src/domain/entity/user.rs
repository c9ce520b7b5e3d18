//! User Entity
//!
//! Durable user record owned by the user repository. Carries the
//! credential hash and the lockout bookkeeping mutated by the
//! lockout guard.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::value_object::{Email, Role, UserId};

/// User record
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Login identifier (unique)
    pub email: Email,
    /// Display name
    pub name: String,
    /// Argon2id hash of the password
    pub password_hash: HashedPassword,
    /// Role (customer, staff, admin)
    pub role: Role,
    /// Disabled accounts cannot sign in
    pub is_active: bool,
    /// Consecutive failed login count
    pub login_attempts: i32,
    /// Temporary lockout expiry after repeated failures
    pub locked_until: Option<DateTime<Utc>>,
    /// Last successful login time
    pub last_login: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user with zeroed lockout state
    pub fn new(email: Email, name: String, password_hash: HashedPassword, role: Role) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            email,
            name,
            password_hash,
            role,
            is_active: true,
            login_attempts: 0,
            locked_until: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the account is currently locked out.
    ///
    /// Locked when `locked_until` lies in the future, or when the
    /// failure counter has reached the threshold. The second condition
    /// keeps an account locked whose window lapsed without a counter
    /// reset (no successful login happened in between).
    pub fn is_locked(&self, threshold: u32) -> bool {
        if let Some(locked_until) = self.locked_until {
            if Utc::now() < locked_until {
                return true;
            }
        }
        self.login_attempts >= threshold as i32
    }

    /// Whether the account may attempt a login at all
    pub fn can_login(&self) -> bool {
        self.is_active
    }
}
