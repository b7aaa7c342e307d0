//! CSRF Service
//!
//! Anti-forgery tokens with their own lifetime and length. Generation works
//! the same way as for sessions; storage is a separate table.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use platform::crypto::generate_token;
use platform::retry::RetryPolicy;

use crate::application::config::{DEFAULT_CSRF_MAX_PER_USER, SessionConfig};
use crate::domain::entity::csrf_token::CsrfToken;
use crate::domain::repository::CsrfRepository;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// A freshly issued CSRF token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfData {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct CsrfService<S> {
    store: Arc<S>,
    config: SessionConfig,
    cleanup: RetryPolicy,
    max_per_user: usize,
}

impl<S> Clone for CsrfService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config,
            cleanup: self.cleanup.clone(),
            max_per_user: self.max_per_user,
        }
    }
}

impl<S> CsrfService<S>
where
    S: CsrfRepository + Send + Sync,
{
    pub fn new(store: Arc<S>, config: SessionConfig, cleanup: RetryPolicy) -> Self {
        Self {
            store,
            config,
            cleanup,
            max_per_user: DEFAULT_CSRF_MAX_PER_USER,
        }
    }

    /// Cap on live CSRF tokens per user; zero is treated as one.
    pub fn with_max_per_user(mut self, max_per_user: usize) -> Self {
        self.max_per_user = max_per_user.max(1);
        self
    }

    /// Issue a token for `user_id`.
    ///
    /// Once the user holds more than the configured number of tokens, the
    /// ones closest to expiry are dropped.
    pub async fn setup_csrf(&self, user_id: UserId) -> AuthResult<CsrfData> {
        let expires_at = Utc::now() + self.config.ttl();

        let token = generate_token(self.config.id_length()).map_err(|e| {
            tracing::error!(error = %e, "CSRF token generation failed");
            AuthError::TokenNotGenerated
        })?;

        let record = CsrfToken {
            token,
            user_id,
            expiration_date: expires_at,
        };
        self.store.create_csrf(&record).await?;

        match self
            .store
            .prune_csrf_for_user(user_id, &record.token, self.max_per_user)
            .await
        {
            Ok(0) => {}
            Ok(pruned) => tracing::debug!(user_id = %user_id, pruned, "Dropped surplus CSRF tokens"),
            Err(e) => tracing::warn!(user_id = %user_id, error = %e, "CSRF token pruning failed"),
        }

        Ok(CsrfData {
            token: record.token,
            expires_at,
        })
    }

    /// Check a presented CSRF token.
    ///
    /// An expired token is deleted before `CsrfExpired` is returned. The
    /// delete is retried under the cleanup policy and a concurrent delete
    /// (not found) counts as done. If every attempt fails the token is still
    /// rejected and the sweep removes it later.
    pub async fn verify_csrf(&self, token: &str) -> AuthResult<()> {
        self.check(token).await.map(|_| ())
    }

    /// Like [`CsrfService::verify_csrf`], and the token must belong to `user_id`.
    pub async fn verify_csrf_for(&self, token: &str, user_id: UserId) -> AuthResult<()> {
        let record = self.check(token).await?;
        ensure_owner(&record, user_id)
    }

    pub async fn delete_csrf(&self, token: &str) -> AuthResult<()> {
        self.store.delete_csrf(token).await
    }

    /// Delete a token only if it belongs to `user_id`.
    pub async fn delete_csrf_for(&self, token: &str, user_id: UserId) -> AuthResult<()> {
        let record = self.store.get_csrf(token).await?;
        ensure_owner(&record, user_id)?;
        self.store.delete_csrf(token).await
    }

    pub fn lifetime(&self) -> Duration {
        self.config.duration()
    }

    async fn check(&self, token: &str) -> AuthResult<CsrfToken> {
        let record = self.store.get_csrf(token).await?;

        if !record.is_expired_at(Utc::now()) {
            return Ok(record);
        }

        let deleted = self
            .cleanup
            .run("delete expired CSRF token", |_| async move {
                match self.store.delete_csrf(token).await {
                    Err(e) if e.is_not_found() => Ok(()),
                    other => other,
                }
            })
            .await;

        if let Err(e) = deleted {
            tracing::error!(
                user_id = %record.user_id,
                error = %e,
                "Expired CSRF token left in store"
            );
        }

        Err(AuthError::CsrfExpired)
    }
}

fn ensure_owner(record: &CsrfToken, user_id: UserId) -> AuthResult<()> {
    if record.user_id != user_id {
        tracing::warn!(
            owner = %record.user_id,
            presented_by = %user_id,
            "CSRF token presented by another user"
        );
        return Err(AuthError::CsrfRejected);
    }
    Ok(())
}
