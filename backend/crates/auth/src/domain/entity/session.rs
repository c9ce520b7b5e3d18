//! Session Entity
//!
//! Server-side session state correlated to a client by the opaque
//! cookie-carried [`SessionId`]. Identity is an explicit enum: a session
//! is either anonymous or carries the full authenticated identity.
//! There is no partially populated state.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{Email, Role, SessionId, UserId};

/// Session identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// No user attached; browsing, cart, etc. still work
    Anonymous,
    /// Established by a successful login, destroyed by logout/timeout
    Authenticated {
        user_id: UserId,
        user_name: String,
        user_email: Email,
        role: Role,
        login_time: DateTime<Utc>,
    },
}

/// Server-side session record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub identity: Identity,
    /// Anti-forgery token, generated lazily on first use
    pub csrf_token: Option<String>,
}

impl SessionRecord {
    /// Fresh anonymous session
    pub fn anonymous() -> Self {
        Self {
            identity: Identity::Anonymous,
            csrf_token: None,
        }
    }

    /// A session is authenticated iff it carries a full identity
    pub fn is_authenticated(&self) -> bool {
        matches!(self.identity, Identity::Authenticated { .. })
    }

    pub fn role(&self) -> Option<Role> {
        match &self.identity {
            Identity::Authenticated { role, .. } => Some(*role),
            Identity::Anonymous => None,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match &self.identity {
            Identity::Authenticated { user_id, .. } => Some(*user_id),
            Identity::Anonymous => None,
        }
    }

    /// Whether the authenticated identity has outlived `lifetime`.
    ///
    /// Anonymous sessions never time out; there is nothing to expire.
    pub fn timed_out(&self, lifetime: Duration) -> bool {
        match &self.identity {
            Identity::Authenticated { login_time, .. } => Utc::now() - *login_time > lifetime,
            Identity::Anonymous => false,
        }
    }

    /// Clear every field, identity and CSRF token alike
    pub fn clear(&mut self) {
        self.identity = Identity::Anonymous;
        self.csrf_token = None;
    }
}

/// Per-request session context threaded through handling.
///
/// Owns the current id and record plus the cookie directives the
/// response writer must honor.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: SessionId,
    pub record: SessionRecord,
    /// Set by logout/timeout; the response must expire the cookie and
    /// the record must not be persisted again
    pub cleared: bool,
    /// Overrides the cookie Max-Age for this response ("remember me")
    pub cookie_max_age: Option<i64>,
}

impl SessionContext {
    /// Start a fresh anonymous session under a new opaque id
    pub fn start() -> Self {
        Self {
            session_id: SessionId::new(),
            record: SessionRecord::anonymous(),
            cleared: false,
            cookie_max_age: None,
        }
    }

    /// Resume an existing session loaded from the store
    pub fn resume(session_id: SessionId, record: SessionRecord) -> Self {
        Self {
            session_id,
            record,
            cleared: false,
            cookie_max_age: None,
        }
    }
}
