//! Session Entity
//!
//! A server-side session. The `session_id` is the opaque bearer token the
//! client carries in the session cookie.

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::value_object::user_id::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: String,
    pub user_id: UserId,
    pub expiry_date: DateTime<Utc>,
}

impl Session {
    /// TTL is provided by the application layer (config), not hard-coded here.
    pub fn new(session_id: String, user_id: UserId, issued_at: DateTime<Utc>, ttl: TimeDelta) -> Self {
        Self {
            session_id,
            user_id,
            expiry_date: issued_at + ttl,
        }
    }

    /// Expired once the expiry date is strictly in the past.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date < now
    }
}
