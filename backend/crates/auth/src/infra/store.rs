//! Credential Store Selection
//!
//! One service implementation, two storage adapters. The adapter is picked
//! from configuration at startup.

use std::fmt;
use std::str::FromStr;

use crate::domain::entity::{
    csrf_token::CsrfToken,
    session::Session,
    user::{NewUser, User, UserCredentials},
};
use crate::domain::repository::{CsrfRepository, SessionRepository, UserRepository};
use crate::domain::value_object::{login::Login, user_id::UserId};
use crate::error::{AuthError, AuthResult};
use crate::infra::{memory::MemoryCredentialStore, postgres::PgCredentialStore};

/// Value of `CREDENTIAL_STORE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(AuthError::InvalidConfig(format!(
                "unknown credential store {other:?}"
            ))),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres => f.write_str("postgres"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Clone)]
pub enum CredentialStore {
    Postgres(PgCredentialStore),
    Memory(MemoryCredentialStore),
}

impl CredentialStore {
    pub fn backend(&self) -> StoreBackend {
        match self {
            Self::Postgres(_) => StoreBackend::Postgres,
            Self::Memory(_) => StoreBackend::Memory,
        }
    }

    /// Sweep expired sessions and CSRF tokens.
    ///
    /// Returns `(sessions_deleted, csrf_deleted)`.
    pub async fn cleanup_expired(&self) -> AuthResult<(u64, u64)> {
        let sessions = self.cleanup_expired_sessions().await?;
        let csrf = self.cleanup_expired_csrf().await?;

        tracing::info!(
            store = %self.backend(),
            sessions_deleted = sessions,
            csrf_deleted = csrf,
            "Cleaned up expired credentials"
        );

        Ok((sessions, csrf))
    }
}

impl SessionRepository for CredentialStore {
    async fn create_session(&self, session: &Session) -> AuthResult<()> {
        match self {
            Self::Postgres(s) => s.create_session(session).await,
            Self::Memory(s) => s.create_session(session).await,
        }
    }

    async fn get_session(&self, session_id: &str) -> AuthResult<Session> {
        match self {
            Self::Postgres(s) => s.get_session(session_id).await,
            Self::Memory(s) => s.get_session(session_id).await,
        }
    }

    async fn delete_session(&self, session_id: &str) -> AuthResult<()> {
        match self {
            Self::Postgres(s) => s.delete_session(session_id).await,
            Self::Memory(s) => s.delete_session(session_id).await,
        }
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        match self {
            Self::Postgres(s) => s.cleanup_expired_sessions().await,
            Self::Memory(s) => s.cleanup_expired_sessions().await,
        }
    }
}

impl CsrfRepository for CredentialStore {
    async fn create_csrf(&self, record: &CsrfToken) -> AuthResult<()> {
        match self {
            Self::Postgres(s) => s.create_csrf(record).await,
            Self::Memory(s) => s.create_csrf(record).await,
        }
    }

    async fn get_csrf(&self, token: &str) -> AuthResult<CsrfToken> {
        match self {
            Self::Postgres(s) => s.get_csrf(token).await,
            Self::Memory(s) => s.get_csrf(token).await,
        }
    }

    async fn delete_csrf(&self, token: &str) -> AuthResult<()> {
        match self {
            Self::Postgres(s) => s.delete_csrf(token).await,
            Self::Memory(s) => s.delete_csrf(token).await,
        }
    }

    async fn cleanup_expired_csrf(&self) -> AuthResult<u64> {
        match self {
            Self::Postgres(s) => s.cleanup_expired_csrf().await,
            Self::Memory(s) => s.cleanup_expired_csrf().await,
        }
    }

    async fn prune_csrf_for_user(
        &self,
        user_id: UserId,
        keep_token: &str,
        keep: usize,
    ) -> AuthResult<u64> {
        match self {
            Self::Postgres(s) => s.prune_csrf_for_user(user_id, keep_token, keep).await,
            Self::Memory(s) => s.prune_csrf_for_user(user_id, keep_token, keep).await,
        }
    }
}

impl UserRepository for CredentialStore {
    async fn get_with_id(&self, user_id: UserId) -> AuthResult<User> {
        match self {
            Self::Postgres(s) => s.get_with_id(user_id).await,
            Self::Memory(s) => s.get_with_id(user_id).await,
        }
    }

    async fn find_by_login(&self, login: &Login) -> AuthResult<Option<UserCredentials>> {
        match self {
            Self::Postgres(s) => s.find_by_login(login).await,
            Self::Memory(s) => s.find_by_login(login).await,
        }
    }

    async fn create_user(&self, user: &NewUser) -> AuthResult<User> {
        match self {
            Self::Postgres(s) => s.create_user(user).await,
            Self::Memory(s) => s.create_user(user).await,
        }
    }
}
