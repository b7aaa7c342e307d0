//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer; every implementation must be safe to share between
//! concurrent requests.

use crate::domain::entity::{
    csrf_token::CsrfToken,
    session::Session,
    user::{NewUser, User, UserCredentials},
};
use crate::domain::value_object::{login::Login, user_id::UserId};
use crate::error::AuthResult;

/// Session credential store
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Fails with `DuplicateToken` if the session ID is already stored
    async fn create_session(&self, session: &Session) -> AuthResult<()>;

    /// Fails with `SessionNotFound` if absent
    async fn get_session(&self, session_id: &str) -> AuthResult<Session>;

    /// Fails with `SessionNotFound` if absent
    async fn delete_session(&self, session_id: &str) -> AuthResult<()>;

    /// Remove every session whose expiry date has passed
    async fn cleanup_expired_sessions(&self) -> AuthResult<u64>;
}

/// CSRF credential store (separate table from sessions)
#[trait_variant::make(CsrfRepository: Send)]
pub trait LocalCsrfRepository {
    /// Fails with `DuplicateToken` if the token is already stored
    async fn create_csrf(&self, record: &CsrfToken) -> AuthResult<()>;

    /// Fails with `CsrfNotFound` if absent
    async fn get_csrf(&self, token: &str) -> AuthResult<CsrfToken>;

    /// Fails with `CsrfNotFound` if absent
    async fn delete_csrf(&self, token: &str) -> AuthResult<()>;

    async fn cleanup_expired_csrf(&self) -> AuthResult<u64>;

    /// Drop `user_id`'s tokens beyond the `keep` latest-expiring ones.
    /// `keep_token` is never dropped. Returns the number removed.
    async fn prune_csrf_for_user(
        &self,
        user_id: UserId,
        keep_token: &str,
        keep: usize,
    ) -> AuthResult<u64>;
}

/// User collaborator
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Fails with `UserNotFound` if absent
    async fn get_with_id(&self, user_id: UserId) -> AuthResult<User>;

    async fn find_by_login(&self, login: &Login) -> AuthResult<Option<UserCredentials>>;

    /// Fails with `LoginTaken` if the login is in use
    async fn create_user(&self, user: &NewUser) -> AuthResult<User>;
}
