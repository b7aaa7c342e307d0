//! User Entity
//!
//! The part of a Tabula user the session core needs. Profile editing and
//! avatars belong to the user service, not here.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;
use serde::Serialize;

use crate::domain::value_object::{login::Login, user_id::UserId};

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub user_id: UserId,
    pub login: Login,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A user together with the stored password hash, for sign-in only.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: HashedPassword,
}

/// Data needed to register a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: Login,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: HashedPassword,
}
