//! Auth (Authentication) Backend Module
//!
//! Session and CSRF credentials for Tabula.
//!
//! Layered structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Credential services, configuration, use cases
//! - `infra/` - PostgreSQL and in-memory credential stores
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Security Model
//! - Session and CSRF tokens are random alphanumeric strings from the OS RNG
//! - Sessions travel in the `tabula_user` HttpOnly cookie
//! - CSRF tokens travel in the `X-Csrf-Token` header, with their own lifetime
//! - Every rejected credential answers with the same 401 body
//! - Passwords hashed with Argon2id

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::{AuthConfig, SessionConfig};
pub use application::{AuthService, CsrfService};
pub use error::{AuthError, AuthResult};
pub use infra::{CredentialStore, MemoryCredentialStore, PgCredentialStore, StoreBackend};
pub use presentation::{AuthAppState, CurrentUser, auth_router, with_session_guard};

// Re-export kernel error types for unified error handling
pub use kernel::error::{app_error::AppError, kind::ErrorKind};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
