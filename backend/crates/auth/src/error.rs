//! Auth Error Types
//!
//! Auth-specific error variants. Services return these unchanged from the
//! store; only the HTTP boundary turns them into status codes, through the
//! `status_code`/`kind` lookup below.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Message shown for every 401, whatever the cause.
const UNAUTHORIZED_MESSAGE: &str = "unauthorized";

#[derive(Debug, Error)]
pub enum AuthError {
    /// The OS random source failed while generating a token
    #[error("Token not generated")]
    TokenNotGenerated,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("CSRF token not found")]
    CsrfNotFound,

    #[error("CSRF token expired")]
    CsrfExpired,

    /// CSRF verification failed; the cause is only logged
    #[error("CSRF token rejected")]
    CsrfRejected,

    /// A generated token collided with a stored one
    #[error("Token already exists")]
    DuplicateToken,

    #[error("Session duration must be greater than zero")]
    SessionNullDuration,

    #[error("Session ID length must be greater than zero")]
    SessionNullIdLength,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing session cookie")]
    MissingSessionCookie,

    #[error("Missing CSRF header")]
    MissingCsrfHeader,

    #[error("User not found")]
    UserNotFound,

    /// Wrong login or password; which one is never disclosed
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Login already taken")]
    LoginTaken,

    #[error("Invalid login: {0}")]
    InvalidLogin(String),

    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP status for this error. Anything not listed is a 500.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::CsrfNotFound
            | AuthError::CsrfExpired
            | AuthError::CsrfRejected
            | AuthError::MissingSessionCookie
            | AuthError::MissingCsrfHeader
            | AuthError::UserNotFound
            | AuthError::InvalidCredentials => ErrorKind::Unauthorized,
            AuthError::InvalidLogin(_) | AuthError::PasswordValidation(_) => {
                ErrorKind::BadRequest
            }
            AuthError::LoginTaken => ErrorKind::Conflict,
            AuthError::TokenNotGenerated
            | AuthError::DuplicateToken
            | AuthError::SessionNullDuration
            | AuthError::SessionNullIdLength
            | AuthError::InvalidConfig(_)
            | AuthError::Database(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// True for "no such token" from either credential store.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AuthError::SessionNotFound | AuthError::CsrfNotFound)
    }

    /// Convert to AppError.
    ///
    /// Every 401 carries the same message so clients cannot tell an
    /// unknown token from an expired one.
    pub fn to_app_error(&self) -> AppError {
        match self.kind() {
            ErrorKind::Unauthorized => AppError::unauthorized(UNAUTHORIZED_MESSAGE),
            kind => AppError::new(kind, self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::TokenNotGenerated | AuthError::DuplicateToken => {
                tracing::error!(error = %self, "Credential issuance failed");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid sign-in attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<kernel::id::IdOutOfRange> for AuthError {
    fn from(err: kernel::id::IdOutOfRange) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::password::PasswordPolicyError> for AuthError {
    fn from(err: platform::password::PasswordPolicyError) -> Self {
        AuthError::PasswordValidation(err.to_string())
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
