//! Login Value Object
//!
//! The handle a user signs in with.
//!
//! - NFKC normalization, then validation, then lowercasing
//! - 3 to 30 characters from `a-z`, `0-9`, `_`, `.`, `-`
//! - Must start with a letter or digit

use serde::{Serialize, Serializer};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

pub const LOGIN_MIN_LENGTH: usize = 3;
pub const LOGIN_MAX_LENGTH: usize = 30;

const ALLOWED_SPECIAL_CHARS: &[char] = &['_', '.', '-'];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Login(String);

impl Login {
    /// Validate user input
    pub fn parse(raw: &str) -> Result<Self, String> {
        let normalized: String = raw.trim().nfkc().collect();
        let length = normalized.chars().count();

        if length < LOGIN_MIN_LENGTH || length > LOGIN_MAX_LENGTH {
            return Err(format!(
                "login must be {LOGIN_MIN_LENGTH}-{LOGIN_MAX_LENGTH} characters"
            ));
        }

        if let Some(bad) = normalized
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !ALLOWED_SPECIAL_CHARS.contains(c))
        {
            return Err(format!("login contains invalid character {bad:?}"));
        }

        if !normalized.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            return Err("login must start with a letter or digit".to_string());
        }

        Ok(Self(normalized.to_ascii_lowercase()))
    }

    /// Trusted value read back from the database
    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Login {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
