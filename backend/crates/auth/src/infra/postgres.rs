//! PostgreSQL Repository Implementations
//!
//! Sessions and CSRF tokens live in separate tables keyed by the token
//! string. Row-level consistency is left to the database.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;
use sqlx::PgPool;

use crate::domain::entity::{
    csrf_token::CsrfToken,
    session::Session,
    user::{NewUser, User, UserCredentials},
};
use crate::domain::repository::{CsrfRepository, SessionRepository, UserRepository};
use crate::domain::value_object::{login::Login, user_id::UserId};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique-key violation to `conflict`; everything else passes through.
fn on_unique_violation(err: sqlx::Error, conflict: AuthError) -> AuthError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => conflict,
        _ => AuthError::Database(err),
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgCredentialStore {
    async fn create_session(&self, session: &Session) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, user_id, expiry_date)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&session.session_id)
        .bind(session.user_id.to_db()?)
        .bind(session.expiry_date)
        .execute(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, AuthError::DuplicateToken))?;

        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> AuthResult<Session> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT session_id, user_id, expiry_date
            FROM sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::SessionNotFound)?;

        row.into_session()
    }

    async fn delete_session(&self, session_id: &str) -> AuthResult<()> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AuthError::SessionNotFound);
        }
        Ok(())
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE expiry_date < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// CSRF Repository Implementation
// ============================================================================

impl CsrfRepository for PgCredentialStore {
    async fn create_csrf(&self, record: &CsrfToken) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO csrf_tokens (token, user_id, expiration_date)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&record.token)
        .bind(record.user_id.to_db()?)
        .bind(record.expiration_date)
        .execute(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, AuthError::DuplicateToken))?;

        Ok(())
    }

    async fn get_csrf(&self, token: &str) -> AuthResult<CsrfToken> {
        let row = sqlx::query_as::<_, CsrfRow>(
            r#"
            SELECT token, user_id, expiration_date
            FROM csrf_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::CsrfNotFound)?;

        row.into_csrf()
    }

    async fn delete_csrf(&self, token: &str) -> AuthResult<()> {
        let deleted = sqlx::query("DELETE FROM csrf_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AuthError::CsrfNotFound);
        }
        Ok(())
    }

    async fn cleanup_expired_csrf(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM csrf_tokens WHERE expiration_date < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn prune_csrf_for_user(
        &self,
        user_id: UserId,
        keep_token: &str,
        keep: usize,
    ) -> AuthResult<u64> {
        let others = i64::try_from(keep.saturating_sub(1)).unwrap_or(i64::MAX);
        let deleted = sqlx::query(
            r#"
            DELETE FROM csrf_tokens
            WHERE user_id = $1
              AND token <> $2
              AND token NOT IN (
                  SELECT token FROM csrf_tokens
                  WHERE user_id = $1 AND token <> $2
                  ORDER BY expiration_date DESC
                  LIMIT $3
              )
            "#,
        )
        .bind(user_id.to_db()?)
        .bind(keep_token)
        .bind(others)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgCredentialStore {
    async fn get_with_id(&self, user_id: UserId) -> AuthResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, login, name, email, password_hash, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.to_db()?)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::UserNotFound)?;

        Ok(row.into_credentials()?.user)
    }

    async fn find_by_login(&self, login: &Login) -> AuthResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, login, name, email, password_hash, created_at
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_credentials).transpose()
    }

    async fn create_user(&self, user: &NewUser) -> AuthResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (login, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, login, name, email, password_hash, created_at
            "#,
        )
        .bind(user.login.as_str())
        .bind(user.name.as_deref())
        .bind(user.email.as_deref())
        .bind(user.password_hash.as_phc_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, AuthError::LoginTaken))?;

        Ok(row.into_credentials()?.user)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: String,
    user_id: i64,
    expiry_date: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> AuthResult<Session> {
        Ok(Session {
            session_id: self.session_id,
            user_id: UserId::from_db(self.user_id)?,
            expiry_date: self.expiry_date,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CsrfRow {
    token: String,
    user_id: i64,
    expiration_date: DateTime<Utc>,
}

impl CsrfRow {
    fn into_csrf(self) -> AuthResult<CsrfToken> {
        Ok(CsrfToken {
            token: self.token,
            user_id: UserId::from_db(self.user_id)?,
            expiration_date: self.expiration_date,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_credentials(self) -> AuthResult<UserCredentials> {
        let password_hash = HashedPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {e}")))?;

        Ok(UserCredentials {
            user: User {
                user_id: UserId::from_db(self.user_id)?,
                login: Login::from_db(self.login),
                name: self.name,
                email: self.email,
                created_at: self.created_at,
            },
            password_hash,
        })
    }
}
