//! Application Layer
//!
//! Credential services and the use cases built on them.

pub mod auth_service;
pub mod config;
pub mod csrf_service;
pub mod sign_in;
pub mod sign_out;
pub mod sign_up;

// Re-exports
pub use auth_service::{AuthService, SessionToken};
pub use config::{AuthConfig, SessionConfig};
pub use csrf_service::{CsrfData, CsrfService};
pub use sign_in::{IssuedCredentials, SignInInput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use sign_up::{SignUpInput, SignUpUseCase};
