//! Sign In Use Case
//!
//! Credential verification wired through the lockout guard and the
//! session manager. Every rejection before password verification is
//! reported as invalid credentials so the response does not reveal
//! which emails exist; only an active lock is named, since the
//! legitimate owner needs to know.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::lockout::LockoutGuard;
use crate::application::session_manager::AuthSessionManager;
use crate::domain::entity::SessionContext;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::Email;
use crate::error::{AuthError, AuthResult};

/// Sign in use case
pub struct SignInUseCase<S, U>
where
    S: SessionStore,
    U: UserRepository,
{
    users: Arc<U>,
    sessions: AuthSessionManager<S, U>,
    lockout: LockoutGuard<U>,
    config: Arc<AuthConfig>,
}

impl<S, U> SignInUseCase<S, U>
where
    S: SessionStore,
    U: UserRepository,
{
    pub fn new(store: Arc<S>, users: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self {
            sessions: AuthSessionManager::new(store, users.clone(), config.clone()),
            lockout: LockoutGuard::new(users.clone(), config.clone()),
            users,
            config,
        }
    }

    /// Verify credentials and establish an authenticated session.
    ///
    /// Order matters: the lockout check runs before any password work
    /// so a locked account cannot be probed, and the failure counter
    /// only moves for emails that exist.
    pub async fn execute(
        &self,
        ctx: &mut SessionContext,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> AuthResult<()> {
        let Ok(email) = Email::new(email) else {
            tracing::debug!("Sign-in rejected: malformed email");
            return Err(AuthError::InvalidCredentials);
        };

        if self.lockout.is_account_locked(&email).await {
            tracing::warn!(email = %email, "Sign-in rejected: account locked");
            return Err(AuthError::AccountLocked);
        }

        let Some(user) = self.users.fetch_by_email(&email).await? else {
            self.lockout.record_failed_login(&email).await;
            return Err(AuthError::InvalidCredentials);
        };

        let verified = match ClearTextPassword::new(password.to_string()) {
            Ok(clear) => user.password_hash.verify(&clear)?,
            // Cannot be the stored password if it violates the policy
            Err(_) => false,
        };

        if !verified {
            self.lockout.record_failed_login(&email).await;
            return Err(AuthError::InvalidCredentials);
        }

        // Only after the password checks out: the distinct message must
        // not tell a guessing caller that the account exists
        if !user.can_login() {
            tracing::warn!(user_id = %user.user_id, "Sign-in rejected: account inactive");
            return Err(AuthError::AccountInactive);
        }

        self.sessions.login(ctx, &user).await?;

        if remember_me {
            let secs = self.config.remember_me_lifetime.as_secs() as i64;
            self.sessions.extend_cookie(ctx, secs);
        }

        Ok(())
    }

    /// The session manager this use case logs in through
    pub fn sessions(&self) -> &AuthSessionManager<S, U> {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::User;
    use crate::domain::value_object::Role;
    use crate::infra::memory::MemoryAuthRepository;
    use platform::password::HashedPassword;

    fn use_case_with_user(
        email: &str,
        password: &str,
        active: bool,
    ) -> SignInUseCase<MemoryAuthRepository, MemoryAuthRepository> {
        let repo = Arc::new(MemoryAuthRepository::default());
        let clear = ClearTextPassword::new(password.to_string()).unwrap();
        let mut user = User::new(
            Email::new(email).unwrap(),
            "Test".to_string(),
            HashedPassword::from_clear_text(&clear).unwrap(),
            Role::Customer,
        );
        user.is_active = active;
        repo.insert_user(user);
        SignInUseCase::new(repo.clone(), repo, Arc::new(AuthConfig::default()))
    }

    #[tokio::test]
    async fn test_correct_credentials_log_in() {
        let use_case = use_case_with_user("a@b.com", "correct horse", true);
        let mut ctx = SessionContext::start();

        use_case
            .execute(&mut ctx, "a@b.com", "correct horse", false)
            .await
            .unwrap();
        assert!(ctx.record.is_authenticated());
        assert_eq!(ctx.cookie_max_age, None);
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let use_case = use_case_with_user("a@b.com", "correct horse", true);
        let mut ctx = SessionContext::start();

        let err = use_case
            .execute(&mut ctx, "a@b.com", "battery staple", false)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(!ctx.record.is_authenticated());
    }

    #[tokio::test]
    async fn test_unknown_email_matches_wrong_password() {
        let use_case = use_case_with_user("a@b.com", "correct horse", true);
        let mut ctx = SessionContext::start();

        let err = use_case
            .execute(&mut ctx, "nobody@b.com", "correct horse", false)
            .await
            .unwrap_err();
        // Indistinguishable from a wrong password
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_inactive_account_rejected() {
        let use_case = use_case_with_user("a@b.com", "correct horse", false);
        let mut ctx = SessionContext::start();

        let err = use_case
            .execute(&mut ctx, "a@b.com", "correct horse", false)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountInactive));
        assert!(!ctx.record.is_authenticated());
    }

    #[tokio::test]
    async fn test_inactive_account_with_wrong_password_is_indistinguishable() {
        let use_case = use_case_with_user("a@b.com", "correct horse", false);
        let mut ctx = SessionContext::start();

        // Without the right password, an inactive account must answer
        // exactly like an unknown one
        let err = use_case
            .execute(&mut ctx, "a@b.com", "battery staple", false)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_locked_account_rejected_even_with_correct_password() {
        let use_case = use_case_with_user("a@b.com", "correct horse", true);
        let mut ctx = SessionContext::start();

        for _ in 0..5 {
            let _ = use_case
                .execute(&mut ctx, "a@b.com", "battery staple", false)
                .await;
        }

        let err = use_case
            .execute(&mut ctx, "a@b.com", "correct horse", false)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountLocked));
    }

    #[tokio::test]
    async fn test_fifth_failure_locks_account() {
        let use_case = use_case_with_user("a@b.com", "correct horse", true);
        let mut ctx = SessionContext::start();

        for _ in 0..4 {
            let _ = use_case
                .execute(&mut ctx, "a@b.com", "battery staple", false)
                .await;
        }
        assert!(matches!(
            use_case
                .execute(&mut ctx, "a@b.com", "battery staple", false)
                .await
                .unwrap_err(),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            use_case
                .execute(&mut ctx, "a@b.com", "battery staple", false)
                .await
                .unwrap_err(),
            AuthError::AccountLocked
        ));
    }

    #[tokio::test]
    async fn test_successful_login_clears_failure_counter() {
        let use_case = use_case_with_user("a@b.com", "correct horse", true);
        let mut ctx = SessionContext::start();

        for _ in 0..4 {
            let _ = use_case
                .execute(&mut ctx, "a@b.com", "battery staple", false)
                .await;
        }
        use_case
            .execute(&mut ctx, "a@b.com", "correct horse", false)
            .await
            .unwrap();

        // Counter reset: four more failures do not lock
        let mut ctx2 = SessionContext::start();
        for _ in 0..4 {
            let _ = use_case
                .execute(&mut ctx2, "a@b.com", "battery staple", false)
                .await;
        }
        use_case
            .execute(&mut ctx2, "a@b.com", "correct horse", false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_remember_me_extends_cookie() {
        let use_case = use_case_with_user("a@b.com", "correct horse", true);
        let mut ctx = SessionContext::start();

        use_case
            .execute(&mut ctx, "a@b.com", "correct horse", true)
            .await
            .unwrap();
        assert_eq!(ctx.cookie_max_age, Some(30 * 24 * 3600));
    }

    #[tokio::test]
    async fn test_malformed_email_is_invalid_credentials() {
        let use_case = use_case_with_user("a@b.com", "correct horse", true);
        let mut ctx = SessionContext::start();

        let err = use_case
            .execute(&mut ctx, "not-an-email", "correct horse", false)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
