//! In-Memory Credential Store
//!
//! Process-local maps behind async locks. Used for local development and
//! tests; everything is lost on restart.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::entity::{
    csrf_token::CsrfToken,
    session::Session,
    user::{NewUser, User, UserCredentials},
};
use crate::domain::repository::{CsrfRepository, SessionRepository, UserRepository};
use crate::domain::value_object::{login::Login, user_id::UserId};
use crate::error::{AuthError, AuthResult};

#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    csrf_tokens: Arc<RwLock<HashMap<String, CsrfToken>>>,
    users: Arc<RwLock<HashMap<UserId, UserCredentials>>>,
    next_user_id: Arc<AtomicU64>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a session as-is, whatever its expiry date
    pub async fn insert_session(&self, session: Session) {
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session);
    }

    /// Store a CSRF record as-is, whatever its expiration date
    pub async fn insert_csrf(&self, record: CsrfToken) {
        self.csrf_tokens
            .write()
            .await
            .insert(record.token.clone(), record);
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn csrf_count(&self) -> usize {
        self.csrf_tokens.read().await.len()
    }
}

impl SessionRepository for MemoryCredentialStore {
    async fn create_session(&self, session: &Session) -> AuthResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.session_id) {
            return Err(AuthError::DuplicateToken);
        }
        sessions.insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> AuthResult<Session> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or(AuthError::SessionNotFound)
    }

    async fn delete_session(&self, session_id: &str) -> AuthResult<()> {
        self.sessions
            .write()
            .await
            .remove(session_id)
            .map(|_| ())
            .ok_or(AuthError::SessionNotFound)
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

impl CsrfRepository for MemoryCredentialStore {
    async fn create_csrf(&self, record: &CsrfToken) -> AuthResult<()> {
        let mut tokens = self.csrf_tokens.write().await;
        if tokens.contains_key(&record.token) {
            return Err(AuthError::DuplicateToken);
        }
        tokens.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn get_csrf(&self, token: &str) -> AuthResult<CsrfToken> {
        self.csrf_tokens
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or(AuthError::CsrfNotFound)
    }

    async fn delete_csrf(&self, token: &str) -> AuthResult<()> {
        self.csrf_tokens
            .write()
            .await
            .remove(token)
            .map(|_| ())
            .ok_or(AuthError::CsrfNotFound)
    }

    async fn cleanup_expired_csrf(&self) -> AuthResult<u64> {
        let now = Utc::now();
        let mut tokens = self.csrf_tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| !t.is_expired_at(now));
        Ok((before - tokens.len()) as u64)
    }

    async fn prune_csrf_for_user(
        &self,
        user_id: UserId,
        keep_token: &str,
        keep: usize,
    ) -> AuthResult<u64> {
        let mut tokens = self.csrf_tokens.write().await;
        let mut owned: Vec<_> = tokens
            .values()
            .filter(|t| t.user_id == user_id && t.token != keep_token)
            .map(|t| (t.expiration_date, t.token.clone()))
            .collect();
        owned.sort_unstable_by(|a, b| b.cmp(a));

        let mut removed = 0;
        for (_, token) in owned.into_iter().skip(keep.saturating_sub(1)) {
            tokens.remove(&token);
            removed += 1;
        }
        Ok(removed)
    }
}

impl UserRepository for MemoryCredentialStore {
    async fn get_with_id(&self, user_id: UserId) -> AuthResult<User> {
        self.users
            .read()
            .await
            .get(&user_id)
            .map(|c| c.user.clone())
            .ok_or(AuthError::UserNotFound)
    }

    async fn find_by_login(&self, login: &Login) -> AuthResult<Option<UserCredentials>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|c| &c.user.login == login)
            .cloned())
    }

    async fn create_user(&self, new_user: &NewUser) -> AuthResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|c| c.user.login == new_user.login) {
            return Err(AuthError::LoginTaken);
        }

        let user = User {
            user_id: UserId::new(self.next_user_id.fetch_add(1, Ordering::Relaxed) + 1),
            login: new_user.login.clone(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            created_at: Utc::now(),
        };
        users.insert(
            user.user_id,
            UserCredentials {
                user: user.clone(),
                password_hash: new_user.password_hash.clone(),
            },
        );
        Ok(user)
    }
}
