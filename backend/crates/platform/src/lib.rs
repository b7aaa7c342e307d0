//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Opaque token generation from the OS CSPRNG
//! - Password hashing (Argon2id)
//! - Cookie management
//! - Bounded retry with exponential backoff

pub mod cookie;
pub mod crypto;
pub mod password;
pub mod retry;
