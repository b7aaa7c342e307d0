//! Auth Service
//!
//! Issues, verifies, and revokes session tokens. Store errors pass through
//! unchanged; the HTTP layer decides what the client sees.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use platform::crypto::generate_token;

use crate::application::config::SessionConfig;
use crate::domain::entity::session::Session;
use crate::domain::repository::SessionRepository;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// A freshly issued session credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub id: String,
    pub expires_at: DateTime<Utc>,
}

pub struct AuthService<S> {
    store: Arc<S>,
    config: SessionConfig,
}

impl<S> Clone for AuthService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config,
        }
    }
}

impl<S> AuthService<S>
where
    S: SessionRepository + Send + Sync,
{
    pub fn new(store: Arc<S>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// Start a session for `user_id`.
    pub async fn auth_user(&self, user_id: UserId) -> AuthResult<SessionToken> {
        let expires_at = Utc::now() + self.config.ttl();

        let id = generate_token(self.config.id_length()).map_err(|e| {
            tracing::error!(error = %e, "Session token generation failed");
            AuthError::TokenNotGenerated
        })?;

        let session = Session {
            session_id: id,
            user_id,
            expiry_date: expires_at,
        };
        self.store.create_session(&session).await?;

        tracing::debug!(user_id = %user_id, expires_at = %expires_at, "Session issued");

        Ok(SessionToken {
            id: session.session_id,
            expires_at,
        })
    }

    /// Resolve a session token to its user.
    ///
    /// Expiry is checked against the stored date on every call. An expired
    /// row is left in place for the sweep.
    pub async fn verify_auth(&self, token: &str) -> AuthResult<UserId> {
        let session = self.store.get_session(token).await?;

        if session.is_expired_at(Utc::now()) {
            return Err(AuthError::SessionExpired);
        }

        Ok(session.user_id)
    }

    pub async fn log_out(&self, token: &str) -> AuthResult<()> {
        self.store.delete_session(token).await
    }

    pub fn lifetime(&self) -> Duration {
        self.config.duration()
    }
}
