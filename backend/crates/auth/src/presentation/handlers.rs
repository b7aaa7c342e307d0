//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::application::config::{AuthConfig, CSRF_HEADER_NAME};
use crate::application::{
    AuthService, CsrfService, IssuedCredentials, SignInInput, SignInUseCase, SignOutUseCase,
    SignUpInput, SignUpUseCase,
};
use crate::domain::repository::{CsrfRepository, SessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AuthResponse, CsrfResponse, SessionStatusResponse, SignInRequest, SignUpRequest,
};
use crate::presentation::middleware::CurrentUser;

/// Shared state for auth handlers and middleware
pub struct AuthAppState<S> {
    pub store: Arc<S>,
    pub auth: AuthService<S>,
    pub csrf: CsrfService<S>,
    pub config: Arc<AuthConfig>,
}

impl<S> Clone for AuthAppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            auth: self.auth.clone(),
            csrf: self.csrf.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> AuthAppState<S>
where
    S: SessionRepository + CsrfRepository + UserRepository + Send + Sync,
{
    /// Wire both services onto one store
    pub fn new(store: S, config: AuthConfig) -> Self {
        let store = Arc::new(store);
        let auth = AuthService::new(Arc::clone(&store), config.session);
        let csrf = CsrfService::new(Arc::clone(&store), config.csrf, config.csrf_cleanup.clone())
            .with_max_per_user(config.csrf_max_per_user);

        Self {
            store,
            auth,
            csrf,
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/signup
pub async fn sign_up<S>(
    State(state): State<AuthAppState<S>>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<Response>
where
    S: SessionRepository + CsrfRepository + UserRepository + Send + Sync + 'static,
{
    let use_case = SignUpUseCase::new(state.store.clone(), state.auth.clone(), state.csrf.clone());

    let input = SignUpInput {
        login: req.login,
        password: req.password,
        name: req.name,
        email: req.email,
    };

    let issued = use_case.execute(input).await?;

    credentials_response(&state, StatusCode::CREATED, issued)
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /api/auth/signin
pub async fn sign_in<S>(
    State(state): State<AuthAppState<S>>,
    Json(req): Json<SignInRequest>,
) -> AuthResult<Response>
where
    S: SessionRepository + CsrfRepository + UserRepository + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(state.store.clone(), state.auth.clone(), state.csrf.clone());

    let input = SignInInput {
        login: req.login,
        password: req.password,
    };

    let issued = use_case.execute(input).await?;

    credentials_response(&state, StatusCode::OK, issued)
}

// ============================================================================
// Sign Out (behind the session guard)
// ============================================================================

/// POST /api/auth/signout
pub async fn sign_out<S>(
    State(state): State<AuthAppState<S>>,
    current: CurrentUser,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    S: SessionRepository + CsrfRepository + UserRepository + Send + Sync + 'static,
{
    let use_case = SignOutUseCase::new(state.auth.clone(), state.csrf.clone());
    let csrf_token = csrf_header(&headers);

    use_case
        .execute(&current.session_token, csrf_token.as_deref(), current.user.user_id)
        .await?;

    let cookie = state
        .config
        .session_cookie
        .clear_cookie()
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok((
        StatusCode::NO_CONTENT,
        [
            (header::SET_COOKIE, cookie),
            (HeaderName::from_static(CSRF_HEADER_NAME), HeaderValue::from_static("")),
        ],
    ))
}

// ============================================================================
// Session Status
// ============================================================================

/// GET /api/auth/status
///
/// Never fails on a bad session; it just reports `authenticated: false`.
pub async fn session_status<S>(
    State(state): State<AuthAppState<S>>,
    headers: HeaderMap,
) -> Json<SessionStatusResponse>
where
    S: SessionRepository + CsrfRepository + UserRepository + Send + Sync + 'static,
{
    let token = platform::cookie::extract_cookie(&headers, &state.config.session_cookie.name);

    let user = match token {
        Some(token) => match state.auth.verify_auth(&token).await {
            Ok(user_id) => state.store.get_with_id(user_id).await.ok(),
            Err(_) => None,
        },
        None => None,
    };

    Json(SessionStatusResponse {
        authenticated: user.is_some(),
        user: user.map(Into::into),
    })
}

// ============================================================================
// CSRF (behind the session guard)
// ============================================================================

/// GET /api/auth/csrf
///
/// Issues a fresh CSRF token for the signed-in user, in the response header.
pub async fn issue_csrf<S>(
    State(state): State<AuthAppState<S>>,
    current: CurrentUser,
) -> AuthResult<impl IntoResponse>
where
    S: SessionRepository + CsrfRepository + UserRepository + Send + Sync + 'static,
{
    let csrf = state.csrf.setup_csrf(current.user.user_id).await?;
    let token = header_value(&csrf.token)?;

    Ok((
        [(HeaderName::from_static(CSRF_HEADER_NAME), token)],
        Json(CsrfResponse {
            expires_at: csrf.expires_at,
        }),
    ))
}

// ============================================================================
// Helper Functions
// ============================================================================

fn credentials_response<S>(
    state: &AuthAppState<S>,
    status: StatusCode,
    issued: IssuedCredentials,
) -> AuthResult<Response>
where
    S: SessionRepository + CsrfRepository + UserRepository + Send + Sync,
{
    let cookie = state
        .config
        .session_cookie
        .set_cookie(&issued.session.id, state.auth.lifetime())
        .map_err(|e| AuthError::Internal(e.to_string()))?;
    let csrf_token = header_value(&issued.csrf.token)?;

    Ok((
        status,
        [
            (header::SET_COOKIE, cookie),
            (HeaderName::from_static(CSRF_HEADER_NAME), csrf_token),
        ],
        Json(AuthResponse {
            user: issued.user.into(),
            expires_at: issued.session.expires_at,
            csrf_expires_at: issued.csrf.expires_at,
        }),
    )
        .into_response())
}

fn header_value(token: &str) -> AuthResult<HeaderValue> {
    HeaderValue::from_str(token).map_err(|e| AuthError::Internal(e.to_string()))
}

/// Trimmed `X-Csrf-Token` value, if present and non-empty
pub(crate) fn csrf_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CSRF_HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
