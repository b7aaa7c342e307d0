//! CSRF Token Entity
//!
//! Anti-forgery token record. Lives in its own table with its own lifetime;
//! it is never derived from the session.

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::value_object::user_id::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    pub token: String,
    pub user_id: UserId,
    pub expiration_date: DateTime<Utc>,
}

impl CsrfToken {
    pub fn new(token: String, user_id: UserId, issued_at: DateTime<Utc>, ttl: TimeDelta) -> Self {
        Self {
            token,
            user_id,
            expiration_date: issued_at + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date < now
    }
}
