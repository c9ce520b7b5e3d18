//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{Identity, SessionRecord, User};
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::{Email, Role, SessionId, UserId};
use crate::error::AuthResult;
use platform::password::HashedPassword;

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserRepository for PgAuthRepository {
    async fn fetch_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id, email, name, password_hash, role, is_active,
                login_attempts, locked_until, last_login, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn fetch_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id, email, name, password_hash, role, is_active,
                login_attempts, locked_until, last_login, created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn increment_login_attempts(&self, email: &Email) -> AuthResult<Option<i32>> {
        // Single-statement increment: concurrent failures for the same
        // email serialize on the row and each observes a distinct count
        let count = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users
            SET login_attempts = login_attempts + 1, updated_at = NOW()
            WHERE email = $1
            RETURNING login_attempts
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(count)
    }

    async fn reset_login_attempts(&self, user_id: &UserId) -> AuthResult<()> {
        sqlx::query(
            "UPDATE users SET login_attempts = 0, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_lock_until(
        &self,
        user_id: &UserId,
        until: Option<DateTime<Utc>>,
    ) -> AuthResult<()> {
        sqlx::query("UPDATE users SET locked_until = $2, updated_at = NOW() WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(until)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_last_login(&self, user_id: &UserId) -> AuthResult<()> {
        sqlx::query("UPDATE users SET last_login = NOW(), updated_at = NOW() WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

impl SessionStore for PgAuthRepository {
    async fn load(&self, id: &SessionId) -> AuthResult<Option<SessionRecord>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                session_id, user_id, user_name, user_email, role,
                login_time, csrf_token, created_at
            FROM sessions
            WHERE session_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_record))
    }

    async fn save(&self, id: &SessionId, record: &SessionRecord) -> AuthResult<()> {
        let (user_id, user_name, user_email, role, login_time) = match &record.identity {
            Identity::Authenticated {
                user_id,
                user_name,
                user_email,
                role,
                login_time,
            } => (
                Some(*user_id.as_uuid()),
                Some(user_name.as_str()),
                Some(user_email.as_str()),
                Some(role.id()),
                Some(*login_time),
            ),
            Identity::Anonymous => (None, None, None, None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO sessions (
                session_id, user_id, user_name, user_email, role,
                login_time, csrf_token
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (session_id)
            DO UPDATE SET
                user_id = EXCLUDED.user_id,
                user_name = EXCLUDED.user_name,
                user_email = EXCLUDED.user_email,
                role = EXCLUDED.role,
                login_time = EXCLUDED.login_time,
                csrf_token = EXCLUDED.csrf_token,
                updated_at = NOW()
            "#,
        )
        .bind(id.as_uuid())
        .bind(user_id)
        .bind(user_name)
        .bind(user_email)
        .bind(role)
        .bind(login_time)
        .bind(record.csrf_token.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> AuthResult<()> {
        sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn rotate(&self, old: &SessionId, new: &SessionId) -> AuthResult<()> {
        sqlx::query(
            "UPDATE sessions SET session_id = $2, updated_at = NOW() WHERE session_id = $1",
        )
        .bind(old.as_uuid())
        .bind(new.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn cleanup_expired(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        // Authenticated sessions age from login, anonymous from creation
        let removed =
            sqlx::query("DELETE FROM sessions WHERE COALESCE(login_time, created_at) < $1")
                .bind(cutoff)
                .execute(&self.pool)
                .await?
                .rows_affected();

        tracing::info!(removed, "Cleaned up expired sessions");
        Ok(removed)
    }
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    role: i16,
    is_active: bool,
    login_attempts: i32,
    locked_until: Option<DateTime<Utc>>,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            name: self.name,
            password_hash: HashedPassword::from_db(self.password_hash),
            role: Role::from_id(self.role),
            is_active: self.is_active,
            login_attempts: self.login_attempts,
            locked_until: self.locked_until,
            last_login: self.last_login,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    #[allow(dead_code)]
    session_id: Uuid,
    user_id: Option<Uuid>,
    user_name: Option<String>,
    user_email: Option<String>,
    role: Option<i16>,
    login_time: Option<DateTime<Utc>>,
    csrf_token: Option<String>,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

impl SessionRow {
    /// A row only yields an authenticated identity when every identity
    /// column is present; anything partial degrades to anonymous.
    fn into_record(self) -> SessionRecord {
        let identity = match (
            self.user_id,
            self.user_name,
            self.user_email,
            self.role,
            self.login_time,
        ) {
            (Some(user_id), Some(user_name), Some(user_email), Some(role), Some(login_time)) => {
                Identity::Authenticated {
                    user_id: UserId::from_uuid(user_id),
                    user_name,
                    user_email: Email::from_db(user_email),
                    role: Role::from_id(role),
                    login_time,
                }
            }
            _ => Identity::Anonymous,
        };

        SessionRecord {
            identity,
            csrf_token: self.csrf_token,
        }
    }
}
