//! Application Configuration
//!
//! Session and CSRF lifetimes, token lengths, and cookie attributes.
//! Loaded once at startup; an invalid configuration stops the process.

use std::time::Duration;

use chrono::TimeDelta;
use platform::cookie::CookieConfig;
use platform::retry::RetryPolicy;

use crate::error::{AuthError, AuthResult};

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Cookie carrying the session token
pub const SESSION_COOKIE_NAME: &str = "tabula_user";

/// Header carrying the CSRF token, in both directions
pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

/// Used when no duration variable is set at all
pub const DEFAULT_DURATION: Duration = Duration::from_secs(14 * 24 * 3600);

/// Used when the ID length variable is not set
pub const DEFAULT_ID_LENGTH: usize = 32;

/// Live CSRF tokens kept per user when `CSRF_MAX_PER_USER` is not set
pub const DEFAULT_CSRF_MAX_PER_USER: usize = 16;

const DURATION_UNITS: [(&str, u64); 4] = [
    ("DAYS", 24 * 3600),
    ("HOURS", 3600),
    ("MINUTES", 60),
    ("SECONDS", 1),
];

/// Lifetime and token length for one kind of credential.
///
/// Both values are guaranteed non-zero once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    duration: Duration,
    ttl: TimeDelta,
    id_length: usize,
}

impl SessionConfig {
    pub fn new(duration: Duration, id_length: usize) -> AuthResult<Self> {
        if duration.is_zero() {
            return Err(AuthError::SessionNullDuration);
        }
        if id_length == 0 {
            return Err(AuthError::SessionNullIdLength);
        }
        let ttl = TimeDelta::from_std(duration)
            .map_err(|e| AuthError::InvalidConfig(format!("duration out of range: {e}")))?;

        Ok(Self {
            duration,
            ttl,
            id_length,
        })
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Duration as a calendar offset for expiry arithmetic
    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn id_length(&self) -> usize {
        self.id_length
    }

    /// Read `{prefix}_DURATION_{DAYS,HOURS,MINUTES,SECONDS}` and `id_length_var`
    /// from the process environment.
    pub fn from_env(prefix: &str, id_length_var: &str) -> AuthResult<Self> {
        Self::from_lookup(prefix, id_length_var, |key| std::env::var(key).ok())
    }

    /// Same as [`SessionConfig::from_env`] over an arbitrary variable source.
    ///
    /// The duration components are summed. If none of them is set the
    /// duration is [`DEFAULT_DURATION`]; if some are set and they sum to
    /// zero the configuration is rejected.
    pub fn from_lookup<F>(prefix: &str, id_length_var: &str, lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut total_secs: u64 = 0;
        let mut any_set = false;

        for (unit, secs_per_unit) in DURATION_UNITS {
            let key = format!("{prefix}_DURATION_{unit}");
            let Some(raw) = lookup(&key) else {
                continue;
            };
            any_set = true;

            let value: u64 = parse_var(&key, &raw)?;
            total_secs = value
                .checked_mul(secs_per_unit)
                .and_then(|secs| total_secs.checked_add(secs))
                .ok_or_else(|| AuthError::InvalidConfig(format!("{key} overflows")))?;
        }

        let duration = if any_set {
            Duration::from_secs(total_secs)
        } else {
            DEFAULT_DURATION
        };

        let id_length = match lookup(id_length_var) {
            Some(raw) => parse_var(id_length_var, &raw)?,
            None => DEFAULT_ID_LENGTH,
        };

        Self::new(duration, id_length)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> AuthResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AuthError::InvalidConfig(format!("{key}={raw:?} is not a valid number")))
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session: SessionConfig,
    pub csrf: SessionConfig,
    /// Attributes of the session cookie
    pub session_cookie: CookieConfig,
    /// Retry policy for deleting an expired CSRF token
    pub csrf_cleanup: RetryPolicy,
    /// Live CSRF tokens kept per user; older ones are dropped on issue
    pub csrf_max_per_user: usize,
}

impl AuthConfig {
    pub fn new(session: SessionConfig, csrf: SessionConfig) -> Self {
        Self {
            session,
            csrf,
            session_cookie: CookieConfig::new(SESSION_COOKIE_NAME),
            csrf_cleanup: RetryPolicy::default(),
            csrf_max_per_user: DEFAULT_CSRF_MAX_PER_USER,
        }
    }

    /// Defaults with an insecure cookie, for local HTTP development
    pub fn development() -> AuthResult<Self> {
        let defaults = SessionConfig::new(DEFAULT_DURATION, DEFAULT_ID_LENGTH)?;
        let mut config = Self::new(defaults, defaults);
        config.session_cookie.secure = false;
        Ok(config)
    }

    /// Load everything from the environment.
    ///
    /// `SESSION_*` and `CSRF_*` are independent; `COOKIE_SECURE=false`
    /// drops the `Secure` attribute; `CSRF_CLEANUP_MAX_ATTEMPTS` bounds the
    /// expired-token delete; `CSRF_MAX_PER_USER` caps live tokens per user.
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session = SessionConfig::from_lookup("SESSION", "SESSION_ID_LENGTH", &lookup)?;
        let csrf = SessionConfig::from_lookup("CSRF", "CSRF_TOKEN_LENGTH", &lookup)?;
        let mut config = Self::new(session, csrf);

        if let Some(raw) = lookup("COOKIE_SECURE") {
            config.session_cookie.secure = parse_var::<bool>("COOKIE_SECURE", &raw)?;
        }
        if let Some(raw) = lookup("CSRF_CLEANUP_MAX_ATTEMPTS") {
            config.csrf_cleanup.max_attempts = parse_var("CSRF_CLEANUP_MAX_ATTEMPTS", &raw)?;
        }
        if let Some(raw) = lookup("CSRF_MAX_PER_USER") {
            let max: usize = parse_var("CSRF_MAX_PER_USER", &raw)?;
            if max == 0 {
                return Err(AuthError::InvalidConfig(
                    "CSRF_MAX_PER_USER must be at least 1".into(),
                ));
            }
            config.csrf_max_per_user = max;
        }

        Ok(config)
    }
}
