//! In-Memory Repository Implementation
//!
//! Mutex-guarded maps implementing both repository traits from one
//! struct. Backs the unit tests and local development without a
//! database; the atomicity the traits require comes from holding the
//! lock across each read-modify-write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entity::{SessionRecord, User};
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::{Email, SessionId, UserId};
use crate::error::{AuthError, AuthResult};

struct StoredSession {
    record: SessionRecord,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, StoredSession>,
}

/// In-memory repository
#[derive(Clone, Default)]
pub struct MemoryAuthRepository {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryAuthRepository {
    /// Seed a user (test/dev setup)
    pub fn insert_user(&self, user: User) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.users.insert(user.user_id.into_uuid(), user);
        }
    }

    fn lock(&self) -> AuthResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| AuthError::Internal("repository mutex poisoned".to_string()))
    }
}

impl UserRepository for MemoryAuthRepository {
    async fn fetch_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let inner = self.lock()?;
        Ok(inner.users.values().find(|u| &u.email == email).cloned())
    }

    async fn fetch_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let inner = self.lock()?;
        Ok(inner.users.get(user_id.as_uuid()).cloned())
    }

    async fn increment_login_attempts(&self, email: &Email) -> AuthResult<Option<i32>> {
        let mut inner = self.lock()?;
        let Some(user) = inner.users.values_mut().find(|u| &u.email == email) else {
            return Ok(None);
        };
        user.login_attempts += 1;
        user.updated_at = Utc::now();
        Ok(Some(user.login_attempts))
    }

    async fn reset_login_attempts(&self, user_id: &UserId) -> AuthResult<()> {
        let mut inner = self.lock()?;
        if let Some(user) = inner.users.get_mut(user_id.as_uuid()) {
            user.login_attempts = 0;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_lock_until(
        &self,
        user_id: &UserId,
        until: Option<DateTime<Utc>>,
    ) -> AuthResult<()> {
        let mut inner = self.lock()?;
        if let Some(user) = inner.users.get_mut(user_id.as_uuid()) {
            user.locked_until = until;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_last_login(&self, user_id: &UserId) -> AuthResult<()> {
        let mut inner = self.lock()?;
        if let Some(user) = inner.users.get_mut(user_id.as_uuid()) {
            user.last_login = Some(Utc::now());
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

impl SessionStore for MemoryAuthRepository {
    async fn load(&self, id: &SessionId) -> AuthResult<Option<SessionRecord>> {
        let inner = self.lock()?;
        Ok(inner.sessions.get(id.as_uuid()).map(|s| s.record.clone()))
    }

    async fn save(&self, id: &SessionId, record: &SessionRecord) -> AuthResult<()> {
        let mut inner = self.lock()?;
        let created_at = inner
            .sessions
            .get(id.as_uuid())
            .map(|s| s.created_at)
            .unwrap_or_else(Utc::now);
        inner.sessions.insert(
            id.into_uuid(),
            StoredSession {
                record: record.clone(),
                created_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> AuthResult<()> {
        let mut inner = self.lock()?;
        inner.sessions.remove(id.as_uuid());
        Ok(())
    }

    async fn rotate(&self, old: &SessionId, new: &SessionId) -> AuthResult<()> {
        let mut inner = self.lock()?;
        if let Some(stored) = inner.sessions.remove(old.as_uuid()) {
            inner.sessions.insert(new.into_uuid(), stored);
        }
        Ok(())
    }

    async fn cleanup_expired(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let mut inner = self.lock()?;
        let before = inner.sessions.len();
        inner.sessions.retain(|_, stored| {
            let reference = match &stored.record.identity {
                crate::domain::entity::Identity::Authenticated { login_time, .. } => *login_time,
                crate::domain::entity::Identity::Anonymous => stored.created_at,
            };
            reference >= cutoff
        });
        Ok((before - inner.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Identity;
    use crate::domain::value_object::Role;
    use chrono::Duration;
    use platform::password::HashedPassword;

    fn user(email: &str) -> User {
        User::new(
            Email::new(email).unwrap(),
            "Test".to_string(),
            HashedPassword::from_db("$argon2id$stub"),
            Role::Customer,
        )
    }

    #[tokio::test]
    async fn test_increment_is_cumulative() {
        let repo = MemoryAuthRepository::default();
        let u = user("a@b.com");
        let email = u.email.clone();
        repo.insert_user(u);

        assert_eq!(repo.increment_login_attempts(&email).await.unwrap(), Some(1));
        assert_eq!(repo.increment_login_attempts(&email).await.unwrap(), Some(2));
        assert_eq!(
            repo.increment_login_attempts(&Email::new("no@b.com").unwrap())
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_rotate_rekeys_record() {
        let repo = MemoryAuthRepository::default();
        let old = SessionId::new();
        let new = SessionId::new();
        let mut record = SessionRecord::anonymous();
        record.csrf_token = Some("cafe".to_string());

        repo.save(&old, &record).await.unwrap();
        repo.rotate(&old, &new).await.unwrap();

        assert!(repo.load(&old).await.unwrap().is_none());
        assert_eq!(repo.load(&new).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_cleanup_uses_login_time_for_authenticated() {
        let repo = MemoryAuthRepository::default();
        let stale = SessionId::new();
        let fresh = SessionId::new();
        let make = |secs_ago: i64| SessionRecord {
            identity: Identity::Authenticated {
                user_id: UserId::new(),
                user_name: "X".to_string(),
                user_email: Email::new("x@y.com").unwrap(),
                role: Role::Customer,
                login_time: Utc::now() - Duration::seconds(secs_ago),
            },
            csrf_token: None,
        };

        repo.save(&stale, &make(7200)).await.unwrap();
        repo.save(&fresh, &make(60)).await.unwrap();

        let removed = repo
            .cleanup_expired(Utc::now() - Duration::seconds(3600))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(repo.load(&stale).await.unwrap().is_none());
        assert!(repo.load(&fresh).await.unwrap().is_some());
    }
}
