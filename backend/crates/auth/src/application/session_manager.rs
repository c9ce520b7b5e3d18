//! Auth Session Manager
//!
//! Owns the session lifecycle: resume/start, login with id rotation,
//! logout, timeout enforcement, and cookie lifetime extension. Composes
//! the session store and the user repository; cookie wire format lives
//! in the presentation layer.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::domain::entity::{Identity, SessionContext, User};
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::SessionId;
use crate::error::AuthResult;

/// Auth session manager
pub struct AuthSessionManager<S, U>
where
    S: SessionStore,
    U: UserRepository,
{
    store: Arc<S>,
    users: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<S, U> AuthSessionManager<S, U>
where
    S: SessionStore,
    U: UserRepository,
{
    pub fn new(store: Arc<S>, users: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self {
            store,
            users,
            config,
        }
    }

    /// Attach to the session named by the incoming cookie, or start an
    /// anonymous one.
    ///
    /// A missing or unknown id starts fresh. A store failure also
    /// starts fresh: session resumption is a convenience feature and
    /// degrades open; access control still fails closed at the guards.
    pub async fn resume_or_start(&self, cookie_id: Option<SessionId>) -> SessionContext {
        let Some(id) = cookie_id else {
            return SessionContext::start();
        };

        match self.store.load(&id).await {
            Ok(Some(record)) => SessionContext::resume(id, record),
            Ok(None) => SessionContext::start(),
            Err(e) => {
                e.log();
                tracing::warn!(session_id = %id, "Session store unavailable, starting anonymous session");
                SessionContext::start()
            }
        }
    }

    /// Establish an authenticated identity for a verified user.
    ///
    /// Writes the full identity with `login_time = now`, then rotates
    /// the session id (same record, new opaque id) so a fixated
    /// pre-login id is worthless. The lockout-state reset in the user
    /// repository is best effort: stale counters are acceptable, a
    /// blocked login for an already-verified user is not.
    pub async fn login(&self, ctx: &mut SessionContext, user: &User) -> AuthResult<()> {
        ctx.record.identity = Identity::Authenticated {
            user_id: user.user_id,
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            role: user.role,
            login_time: Utc::now(),
        };

        // Persist under the old id, then re-key.
        self.store.save(&ctx.session_id, &ctx.record).await?;

        let new_id = SessionId::new();
        self.store.rotate(&ctx.session_id, &new_id).await?;
        let old_id = ctx.session_id;
        ctx.session_id = new_id;

        if let Err(e) = self.reset_lockout_state(user).await {
            e.log();
            tracing::warn!(
                user_id = %user.user_id,
                "Failed to reset lockout state after login; continuing"
            );
        }

        tracing::info!(
            user_id = %user.user_id,
            old_session = %old_id,
            new_session = %ctx.session_id,
            "User logged in, session id rotated"
        );

        Ok(())
    }

    async fn reset_lockout_state(&self, user: &User) -> AuthResult<()> {
        self.users.reset_login_attempts(&user.user_id).await?;
        self.users.set_lock_until(&user.user_id, None).await?;
        self.users.update_last_login(&user.user_id).await?;
        Ok(())
    }

    /// Clear every session field and delete the server-side record.
    ///
    /// The caller's response must expire the cookie; `ctx.cleared`
    /// signals that to the presentation layer.
    pub async fn logout(&self, ctx: &mut SessionContext) {
        ctx.record.clear();
        ctx.cleared = true;
        ctx.cookie_max_age = None;

        if let Err(e) = self.store.delete(&ctx.session_id).await {
            e.log();
            tracing::warn!(session_id = %ctx.session_id, "Failed to delete session record");
        }
    }

    /// Enforce the session lifetime; returns true when the session
    /// timed out and was cleared exactly as a logout.
    ///
    /// Runs once per request before any guarded logic; on timeout the
    /// caller redirects to the login page with the `timeout=1` marker
    /// and stops handling.
    pub async fn check_timeout(&self, ctx: &mut SessionContext) -> bool {
        if !ctx.record.timed_out(self.config.session_lifetime_chrono()) {
            return false;
        }

        tracing::info!(session_id = %ctx.session_id, "Session timed out, forcing logout");
        self.logout(ctx).await;
        true
    }

    /// Reissue the session cookie with `Max-Age = seconds`, keeping the
    /// same id and server-side state ("remember me"). Does not
    /// re-verify credentials.
    pub fn extend_cookie(&self, ctx: &mut SessionContext, seconds: i64) {
        ctx.cookie_max_age = Some(seconds);
        tracing::debug!(session_id = %ctx.session_id, seconds, "Session cookie extended");
    }

    /// Write the current record back to the store (end of request).
    /// Cleared sessions are not resurrected.
    pub async fn persist(&self, ctx: &SessionContext) -> AuthResult<()> {
        if ctx.cleared {
            return Ok(());
        }
        self.store.save(&ctx.session_id, &ctx.record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{Email, Role};
    use crate::infra::memory::MemoryAuthRepository;
    use platform::password::HashedPassword;

    fn manager() -> (
        AuthSessionManager<MemoryAuthRepository, MemoryAuthRepository>,
        Arc<MemoryAuthRepository>,
    ) {
        let repo = Arc::new(MemoryAuthRepository::default());
        (
            AuthSessionManager::new(repo.clone(), repo.clone(), Arc::new(AuthConfig::default())),
            repo,
        )
    }

    fn test_user() -> User {
        User::new(
            Email::new("a@b.com").unwrap(),
            "Alice".to_string(),
            HashedPassword::from_db("$argon2id$stub"),
            Role::Staff,
        )
    }

    #[tokio::test]
    async fn test_resume_unknown_id_starts_fresh() {
        let (manager, _) = manager();
        let ctx = manager.resume_or_start(Some(SessionId::new())).await;
        assert!(!ctx.record.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_writes_identity_and_rotates_id() {
        let (manager, _) = manager();
        let user = test_user();

        let mut ctx = SessionContext::start();
        let id_before = ctx.session_id;
        manager.login(&mut ctx, &user).await.unwrap();

        assert_ne!(ctx.session_id, id_before);
        match &ctx.record.identity {
            Identity::Authenticated {
                user_id,
                user_email,
                role,
                ..
            } => {
                assert_eq!(*user_id, user.user_id);
                assert_eq!(user_email.as_str(), "a@b.com");
                assert_eq!(*role, Role::Staff);
            }
            Identity::Anonymous => panic!("expected authenticated identity"),
        }

        // The rotated id resumes; the pre-login id is dead
        let resumed = manager.resume_or_start(Some(ctx.session_id)).await;
        assert!(resumed.record.is_authenticated());
        let fixated = manager.resume_or_start(Some(id_before)).await;
        assert!(!fixated.record.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_resets_lockout_state() {
        let (manager, repo) = manager();
        let mut user = test_user();
        user.login_attempts = 4;
        user.locked_until = Some(Utc::now() - chrono::Duration::seconds(5));
        repo.insert_user(user.clone());

        let mut ctx = SessionContext::start();
        manager.login(&mut ctx, &user).await.unwrap();

        let stored = repo.fetch_by_email(&user.email).await.unwrap().unwrap();
        assert_eq!(stored.login_attempts, 0);
        assert!(stored.locked_until.is_none());
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let (manager, _) = manager();
        let user = test_user();

        let mut ctx = SessionContext::start();
        manager.login(&mut ctx, &user).await.unwrap();
        let id = ctx.session_id;

        manager.logout(&mut ctx).await;

        assert!(!ctx.record.is_authenticated());
        assert!(ctx.record.csrf_token.is_none());
        assert!(ctx.cleared);
        let resumed = manager.resume_or_start(Some(id)).await;
        assert!(!resumed.record.is_authenticated());
    }

    #[tokio::test]
    async fn test_check_timeout_boundary() {
        let (manager, _) = manager();
        let user = test_user();

        let mut fresh = SessionContext::start();
        manager.login(&mut fresh, &user).await.unwrap();
        if let Identity::Authenticated { login_time, .. } = &mut fresh.record.identity {
            *login_time = Utc::now() - chrono::Duration::seconds(3599);
        }
        assert!(!manager.check_timeout(&mut fresh).await);
        assert!(fresh.record.is_authenticated());

        let mut stale = SessionContext::start();
        manager.login(&mut stale, &user).await.unwrap();
        if let Identity::Authenticated { login_time, .. } = &mut stale.record.identity {
            *login_time = Utc::now() - chrono::Duration::seconds(3601);
        }
        assert!(manager.check_timeout(&mut stale).await);
        assert!(!stale.record.is_authenticated());
        assert!(stale.cleared);
    }

    #[tokio::test]
    async fn test_extend_cookie_keeps_id_and_state() {
        let (manager, _) = manager();
        let user = test_user();

        let mut ctx = SessionContext::start();
        manager.login(&mut ctx, &user).await.unwrap();
        let id = ctx.session_id;
        let record = ctx.record.clone();

        manager.extend_cookie(&mut ctx, 86400);

        assert_eq!(ctx.session_id, id);
        assert_eq!(ctx.record, record);
        assert_eq!(ctx.cookie_max_age, Some(86400));
    }
}
