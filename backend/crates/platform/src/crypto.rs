//! Cryptographic Utilities
//!
//! Bearer tokens (session IDs, CSRF tokens) come from a CSPRNG seeded by the
//! operating system on every call.

use rand::distributions::Alphanumeric;
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Token alphabet: `a-z`, `A-Z`, `0-9`
pub const TOKEN_ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("secure random source failed: {0}")]
    RandomSource(#[from] rand::Error),
}

/// Generate a token of exactly `length` alphanumeric characters.
///
/// Each call seeds a fresh ChaCha generator from the OS, so a failing
/// entropy source surfaces as an error instead of a panic.
pub fn generate_token(length: usize) -> Result<String, TokenError> {
    let rng = StdRng::from_rng(OsRng)?;

    Ok(rng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect())
}
