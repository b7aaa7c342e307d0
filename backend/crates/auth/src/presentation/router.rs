//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::domain::repository::{CsrfRepository, SessionRepository, UserRepository};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{require_auth, require_csrf};

/// Routes under `/api/auth`.
///
/// `signup`, `signin` and `status` are public. `csrf` needs a session only,
/// since it is how a client without a CSRF token gets one. `signout` sits
/// behind both gates.
pub fn auth_router<S>(state: AuthAppState<S>) -> Router
where
    S: SessionRepository + CsrfRepository + UserRepository + Send + Sync + 'static,
{
    let guarded = Router::new().route("/signout", post(handlers::sign_out::<S>));

    let session_only = Router::new()
        .route("/csrf", get(handlers::issue_csrf::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<S>,
        ));

    Router::new()
        .route("/signup", post(handlers::sign_up::<S>))
        .route("/signin", post(handlers::sign_in::<S>))
        .route("/status", get(handlers::session_status::<S>))
        .merge(with_session_guard(guarded, state.clone()))
        .merge(session_only)
        .with_state(state)
}

/// Put `routes` behind the auth gate, then the CSRF gate.
///
/// Handlers inside can extract [`CurrentUser`](crate::presentation::middleware::CurrentUser).
/// `routes` must already contain at least one route.
pub fn with_session_guard<T, S>(routes: Router<T>, state: AuthAppState<S>) -> Router<T>
where
    T: Clone + Send + Sync + 'static,
    S: SessionRepository + CsrfRepository + UserRepository + Send + Sync + 'static,
{
    // The layer added last runs first
    routes
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_csrf::<S>,
        ))
        .route_layer(middleware::from_fn_with_state(state, require_auth::<S>))
}
