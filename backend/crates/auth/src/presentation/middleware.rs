//! Auth and CSRF Middleware
//!
//! Two gates run in order in front of protected routes:
//!
//! 1. `require_auth`: session cookie, then session lookup, then user lookup.
//!    The user lands in the request extensions as [`CurrentUser`].
//! 2. `require_csrf`: `X-Csrf-Token` header checked against the CSRF store,
//!    whatever the method. Behind `require_auth` the token must also belong
//!    to the session's user.
//!
//! Both short-circuit with an error response; neither writes to the store
//! except through the CSRF expiry cleanup.

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::config::CSRF_HEADER_NAME;
use crate::domain::entity::user::User;
use crate::domain::repository::{CsrfRepository, SessionRepository, UserRepository};
use crate::error::AuthError;
use crate::presentation::handlers::{AuthAppState, csrf_header};

/// The authenticated user, set by `require_auth`
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    /// Session token the request was authenticated with
    pub session_token: String,
}

impl<T> FromRequestParts<T> for CurrentUser
where
    T: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &T) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingSessionCookie)
    }
}

/// Middleware that requires a valid session
pub async fn require_auth<S>(
    State(state): State<AuthAppState<S>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    S: SessionRepository + CsrfRepository + UserRepository + Send + Sync + 'static,
{
    let Some(token) =
        platform::cookie::extract_cookie(req.headers(), &state.config.session_cookie.name)
    else {
        return reject_session(AuthError::MissingSessionCookie);
    };

    let user_id = match state.auth.verify_auth(&token).await {
        Ok(user_id) => user_id,
        Err(e) => return reject_session(e),
    };

    // A session for a deleted user is reported as unauthorized, not 404
    let user = match state.store.get_with_id(user_id).await {
        Ok(user) => user,
        Err(e) => return reject_session(e),
    };

    req.extensions_mut().insert(CurrentUser {
        user,
        session_token: token,
    });

    next.run(req).await
}

/// Middleware that requires a valid CSRF token on every request
pub async fn require_csrf<S>(
    State(state): State<AuthAppState<S>>,
    req: Request<Body>,
    next: Next,
) -> Response
where
    S: SessionRepository + CsrfRepository + UserRepository + Send + Sync + 'static,
{
    let Some(token) = csrf_header(req.headers()) else {
        tracing::info!(method = %req.method(), path = %req.uri().path(), "Missing CSRF header");
        return AuthError::CsrfRejected.into_response();
    };

    let owner = req
        .extensions()
        .get::<CurrentUser>()
        .map(|current| current.user.user_id);

    let verified = match owner {
        Some(user_id) => state.csrf.verify_csrf_for(&token, user_id).await,
        None => state.csrf.verify_csrf(&token).await,
    };

    if let Err(e) = verified {
        tracing::info!(error = %e, path = %req.uri().path(), "CSRF verification failed");
        return AuthError::CsrfRejected.into_response();
    }

    next.run(req).await
}

/// Error response with the CSRF header blanked
fn reject_session(err: AuthError) -> Response {
    let mut response = err.into_response();
    response.headers_mut().insert(
        HeaderName::from_static(CSRF_HEADER_NAME),
        HeaderValue::from_static(""),
    );
    response
}
