//! Crate-level tests for the auth crate
//! Services against the in-memory store, then the HTTP gates and routes.

#[cfg(test)]
mod service_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use chrono::{TimeDelta, Utc};
    use platform::password::ClearTextPassword;
    use platform::retry::RetryPolicy;

    use crate::application::{
        AuthService, CsrfService, SessionConfig, SignInInput, SignInUseCase, SignOutUseCase,
    };
    use crate::domain::entity::{csrf_token::CsrfToken, session::Session, user::NewUser};
    use crate::domain::repository::{CsrfRepository, SessionRepository, UserRepository};
    use crate::domain::value_object::{login::Login, user_id::UserId};
    use crate::error::{AuthError, AuthResult};
    use crate::infra::MemoryCredentialStore;

    fn config(secs: u64, len: usize) -> SessionConfig {
        SessionConfig::new(Duration::from_secs(secs), len).unwrap()
    }

    fn auth_service(store: &MemoryCredentialStore, secs: u64, len: usize) -> AuthService<MemoryCredentialStore> {
        AuthService::new(Arc::new(store.clone()), config(secs, len))
    }

    fn csrf_service(store: &MemoryCredentialStore) -> CsrfService<MemoryCredentialStore> {
        CsrfService::new(
            Arc::new(store.clone()),
            config(3600, 32),
            RetryPolicy::immediate(3),
        )
    }

    #[tokio::test]
    async fn test_issue_verify_logout_scenario() {
        let store = MemoryCredentialStore::new();
        let auth = auth_service(&store, 30 * 60, 32);

        let issued_at = Utc::now();
        let token = auth.auth_user(UserId::new(42)).await.unwrap();

        assert_eq!(token.id.len(), 32);
        assert!(token.id.chars().all(|c| c.is_ascii_alphanumeric()));
        let drift = (token.expires_at - issued_at) - TimeDelta::minutes(30);
        assert!(drift.num_seconds().abs() <= 1);

        assert_eq!(auth.verify_auth(&token.id).await.unwrap(), UserId::new(42));

        auth.log_out(&token.id).await.unwrap();
        assert!(matches!(
            auth.verify_auth(&token.id).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let store = MemoryCredentialStore::new();
        let auth = auth_service(&store, 60, 32);
        let now = Utc::now();

        store
            .insert_session(Session::new("stale".into(), UserId::new(1), now, -TimeDelta::seconds(1)))
            .await;
        store
            .insert_session(Session::new("fresh".into(), UserId::new(1), now, TimeDelta::seconds(1)))
            .await;

        assert!(matches!(
            auth.verify_auth("stale").await,
            Err(AuthError::SessionExpired)
        ));
        assert_eq!(auth.verify_auth("fresh").await.unwrap(), UserId::new(1));
    }

    #[tokio::test]
    async fn test_expired_session_is_left_for_sweep() {
        let store = MemoryCredentialStore::new();
        let auth = auth_service(&store, 60, 32);
        store
            .insert_session(Session::new("stale".into(), UserId::new(1), Utc::now(), -TimeDelta::hours(1)))
            .await;

        let _ = auth.verify_auth("stale").await;
        assert_eq!(store.session_count().await, 1);

        assert_eq!(store.cleanup_expired_sessions().await.unwrap(), 1);
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_session_not_found() {
        let store = MemoryCredentialStore::new();
        let auth = auth_service(&store, 60, 32);

        assert!(matches!(
            auth.verify_auth("nope").await,
            Err(AuthError::SessionNotFound)
        ));
        assert!(matches!(
            auth.log_out("nope").await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_configured_id_length_is_used() {
        let store = MemoryCredentialStore::new();
        let auth = auth_service(&store, 60, 7);

        let token = auth.auth_user(UserId::new(3)).await.unwrap();
        assert_eq!(token.id.len(), 7);
        assert_eq!(auth.lifetime(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_csrf_round_trip() {
        let store = MemoryCredentialStore::new();
        let csrf = csrf_service(&store);

        let data = csrf.setup_csrf(UserId::new(7)).await.unwrap();
        assert_eq!(data.token.len(), 32);
        csrf.verify_csrf(&data.token).await.unwrap();

        csrf.delete_csrf(&data.token).await.unwrap();
        assert!(matches!(
            csrf.verify_csrf(&data.token).await,
            Err(AuthError::CsrfNotFound)
        ));
    }

    #[tokio::test]
    async fn test_csrf_expiry_self_cleans() {
        let store = MemoryCredentialStore::new();
        let csrf = csrf_service(&store);
        store
            .insert_csrf(CsrfToken::new("old".into(), UserId::new(1), Utc::now(), -TimeDelta::seconds(1)))
            .await;

        assert!(matches!(
            csrf.verify_csrf("old").await,
            Err(AuthError::CsrfExpired)
        ));
        assert!(matches!(
            store.get_csrf("old").await,
            Err(AuthError::CsrfNotFound)
        ));
        assert!(matches!(
            csrf.verify_csrf("old").await,
            Err(AuthError::CsrfNotFound)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_verify_of_expired_csrf() {
        let store = MemoryCredentialStore::new();
        let csrf = csrf_service(&store);
        store
            .insert_csrf(CsrfToken::new("old".into(), UserId::new(1), Utc::now(), -TimeDelta::seconds(1)))
            .await;

        let (a, b) = tokio::join!(csrf.verify_csrf("old"), csrf.verify_csrf("old"));

        for result in [a, b] {
            assert!(
                matches!(result, Err(AuthError::CsrfExpired | AuthError::CsrfNotFound)),
                "unexpected result: {result:?}"
            );
        }
        assert_eq!(store.csrf_count().await, 0);
    }

    #[tokio::test]
    async fn test_csrf_bound_to_owner() {
        let store = MemoryCredentialStore::new();
        let csrf = csrf_service(&store);
        let data = csrf.setup_csrf(UserId::new(1)).await.unwrap();

        assert!(matches!(
            csrf.verify_csrf_for(&data.token, UserId::new(2)).await,
            Err(AuthError::CsrfRejected)
        ));
        assert!(matches!(
            csrf.delete_csrf_for(&data.token, UserId::new(2)).await,
            Err(AuthError::CsrfRejected)
        ));
        assert_eq!(store.csrf_count().await, 1);

        csrf.verify_csrf_for(&data.token, UserId::new(1)).await.unwrap();
        csrf.delete_csrf_for(&data.token, UserId::new(1)).await.unwrap();
        assert_eq!(store.csrf_count().await, 0);
    }

    #[tokio::test]
    async fn test_csrf_tokens_per_user_are_capped() {
        let store = MemoryCredentialStore::new();
        let csrf = csrf_service(&store).with_max_per_user(3);

        let mut latest = None;
        for _ in 0..10 {
            latest = Some(csrf.setup_csrf(UserId::new(1)).await.unwrap());
        }
        csrf.setup_csrf(UserId::new(2)).await.unwrap();

        assert_eq!(store.csrf_count().await, 4);
        // The token just handed out is always kept
        csrf.verify_csrf(&latest.unwrap().token).await.unwrap();
    }

    #[tokio::test]
    async fn test_sign_out_keeps_foreign_csrf() {
        let store = MemoryCredentialStore::new();
        let auth = auth_service(&store, 3600, 32);
        let csrf = csrf_service(&store);
        let sign_out = SignOutUseCase::new(auth.clone(), csrf.clone());

        let session = auth.auth_user(UserId::new(1)).await.unwrap();
        let foreign = csrf.setup_csrf(UserId::new(2)).await.unwrap();

        sign_out
            .execute(&session.id, Some(&foreign.token), UserId::new(1))
            .await
            .unwrap();

        assert_eq!(store.session_count().await, 0);
        csrf.verify_csrf(&foreign.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_sign_in_unknown_login_is_invalid_credentials() {
        let store = MemoryCredentialStore::new();
        store
            .create_user(&NewUser {
                login: Login::parse("ada").unwrap(),
                name: None,
                email: None,
                password_hash: ClearTextPassword::new("correct horse battery".into())
                    .unwrap()
                    .hash()
                    .unwrap(),
            })
            .await
            .unwrap();
        let sign_in = SignInUseCase::new(
            Arc::new(store.clone()),
            auth_service(&store, 3600, 32),
            csrf_service(&store),
        );

        for login in ["nobody", "", "ada"] {
            let result = sign_in
                .execute(SignInInput {
                    login: login.into(),
                    password: "wrong password".into(),
                })
                .await;
            assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        }
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_session_and_csrf_lifetimes_are_independent() {
        let store = MemoryCredentialStore::new();
        let auth = auth_service(&store, 14 * 24 * 3600, 32);
        let csrf = CsrfService::new(Arc::new(store.clone()), config(300, 16), RetryPolicy::default());

        assert_eq!(auth.lifetime(), Duration::from_secs(14 * 24 * 3600));
        assert_eq!(csrf.lifetime(), Duration::from_secs(300));

        let data = csrf.setup_csrf(UserId::new(1)).await.unwrap();
        assert_eq!(data.token.len(), 16);
    }

    /// Delegates to the memory store but fails the first `failures` deletes
    struct FlakyCsrfStore {
        inner: MemoryCredentialStore,
        failures: AtomicU32,
        delete_calls: AtomicU32,
    }

    impl FlakyCsrfStore {
        fn new(inner: MemoryCredentialStore, failures: u32) -> Self {
            Self {
                inner,
                failures: AtomicU32::new(failures),
                delete_calls: AtomicU32::new(0),
            }
        }
    }

    impl CsrfRepository for FlakyCsrfStore {
        async fn create_csrf(&self, record: &CsrfToken) -> AuthResult<()> {
            self.inner.create_csrf(record).await
        }

        async fn get_csrf(&self, token: &str) -> AuthResult<CsrfToken> {
            self.inner.get_csrf(token).await
        }

        async fn delete_csrf(&self, token: &str) -> AuthResult<()> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(AuthError::Internal("connection reset".into()));
            }
            self.inner.delete_csrf(token).await
        }

        async fn cleanup_expired_csrf(&self) -> AuthResult<u64> {
            self.inner.cleanup_expired_csrf().await
        }

        async fn prune_csrf_for_user(
            &self,
            user_id: UserId,
            keep_token: &str,
            keep: usize,
        ) -> AuthResult<u64> {
            self.inner.prune_csrf_for_user(user_id, keep_token, keep).await
        }
    }

    async fn flaky_with_expired_token(failures: u32) -> (MemoryCredentialStore, Arc<FlakyCsrfStore>) {
        let inner = MemoryCredentialStore::new();
        inner
            .insert_csrf(CsrfToken::new("old".into(), UserId::new(1), Utc::now(), -TimeDelta::minutes(1)))
            .await;
        let flaky = Arc::new(FlakyCsrfStore::new(inner.clone(), failures));
        (inner, flaky)
    }

    #[tokio::test]
    async fn test_csrf_cleanup_retries_transient_failures() {
        let (inner, flaky) = flaky_with_expired_token(2).await;
        let csrf = CsrfService::new(flaky.clone(), config(60, 32), RetryPolicy::immediate(3));

        assert!(matches!(
            csrf.verify_csrf("old").await,
            Err(AuthError::CsrfExpired)
        ));
        assert_eq!(flaky.delete_calls.load(Ordering::SeqCst), 3);
        assert_eq!(inner.csrf_count().await, 0);
    }

    #[tokio::test]
    async fn test_csrf_cleanup_is_bounded() {
        let (inner, flaky) = flaky_with_expired_token(10).await;
        let csrf = CsrfService::new(flaky.clone(), config(60, 32), RetryPolicy::immediate(3));

        // Still rejected even though the record survived
        assert!(matches!(
            csrf.verify_csrf("old").await,
            Err(AuthError::CsrfExpired)
        ));
        assert_eq!(flaky.delete_calls.load(Ordering::SeqCst), 3);
        assert_eq!(inner.csrf_count().await, 1);

        // A later verify still refuses it
        assert!(matches!(
            csrf.verify_csrf("old").await,
            Err(AuthError::CsrfExpired)
        ));
    }
}

#[cfg(test)]
mod middleware_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::routing::{get, post};
    use chrono::{TimeDelta, Utc};
    use platform::password::ClearTextPassword;
    use tower::ServiceExt;

    use crate::application::config::{AuthConfig, CSRF_HEADER_NAME, SESSION_COOKIE_NAME};
    use crate::domain::entity::{session::Session, user::NewUser};
    use crate::domain::repository::UserRepository;
    use crate::domain::value_object::{login::Login, user_id::UserId};
    use crate::infra::MemoryCredentialStore;
    use crate::presentation::{AuthAppState, CurrentUser, with_session_guard};

    struct Harness {
        app: Router,
        state: AuthAppState<MemoryCredentialStore>,
        store: MemoryCredentialStore,
        reached: Arc<AtomicBool>,
        user_id: UserId,
    }

    async fn harness() -> Harness {
        let store = MemoryCredentialStore::new();
        let password_hash = ClearTextPassword::new("correct horse battery".into())
            .unwrap()
            .hash()
            .unwrap();
        let user = store
            .create_user(&NewUser {
                login: Login::parse("ada").unwrap(),
                name: Some("Ada".into()),
                email: None,
                password_hash,
            })
            .await
            .unwrap();

        let state = AuthAppState::new(store.clone(), AuthConfig::development().unwrap());
        let reached = Arc::new(AtomicBool::new(false));

        let hit = reached.clone();
        let seen = reached.clone();
        let routes = Router::new()
            .route(
                "/boards",
                post(move || async move {
                    hit.store(true, Ordering::SeqCst);
                    StatusCode::CREATED
                }),
            )
            .route(
                "/me",
                get(move |current: CurrentUser| async move {
                    seen.store(true, Ordering::SeqCst);
                    current.user.login.to_string()
                }),
            );

        Harness {
            app: with_session_guard(routes, state.clone()),
            state,
            store,
            reached,
            user_id: user.user_id,
        }
    }

    fn cookie(token: &str) -> String {
        format!("{SESSION_COOKIE_NAME}={token}")
    }

    #[tokio::test]
    async fn test_missing_cookie_is_rejected() {
        let h = harness().await;

        let response = h
            .app
            .oneshot(Request::post("/boards").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!h.reached.load(Ordering::SeqCst));
        assert_eq!(response.headers().get(CSRF_HEADER_NAME).unwrap(), "");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], 401);
        assert_eq!(json["error_response"], "unauthorized");
    }

    #[tokio::test]
    async fn test_missing_csrf_header_is_rejected() {
        let h = harness().await;
        let session = h.state.auth.auth_user(h.user_id).await.unwrap();

        let response = h
            .app
            .oneshot(
                Request::post("/boards")
                    .header(header::COOKIE, cookie(&session.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!h.reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unknown_csrf_token_is_rejected() {
        let h = harness().await;
        let session = h.state.auth.auth_user(h.user_id).await.unwrap();

        let response = h
            .app
            .oneshot(
                Request::post("/boards")
                    .header(header::COOKIE, cookie(&session.id))
                    .header(CSRF_HEADER_NAME, "forged")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!h.reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_valid_session_and_csrf_pass() {
        let h = harness().await;
        let session = h.state.auth.auth_user(h.user_id).await.unwrap();
        let csrf = h.state.csrf.setup_csrf(h.user_id).await.unwrap();

        let response = h
            .app
            .oneshot(
                Request::post("/boards")
                    .header(header::COOKIE, cookie(&session.id))
                    .header(CSRF_HEADER_NAME, csrf.token.as_str())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(h.reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_get_without_csrf_header_is_rejected() {
        let h = harness().await;
        let session = h.state.auth.auth_user(h.user_id).await.unwrap();

        let response = h
            .app
            .oneshot(
                Request::get("/me")
                    .header(header::COOKIE, cookie(&session.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!h.reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_get_with_csrf_sees_user() {
        let h = harness().await;
        let session = h.state.auth.auth_user(h.user_id).await.unwrap();
        let csrf = h.state.csrf.setup_csrf(h.user_id).await.unwrap();

        let response = h
            .app
            .oneshot(
                Request::get("/me")
                    .header(header::COOKIE, cookie(&session.id))
                    .header(CSRF_HEADER_NAME, csrf.token.as_str())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ada");
    }

    #[tokio::test]
    async fn test_csrf_token_of_another_user_is_rejected() {
        let h = harness().await;
        let session = h.state.auth.auth_user(h.user_id).await.unwrap();
        let foreign = h.state.csrf.setup_csrf(UserId::new(999)).await.unwrap();

        let response = h
            .app
            .oneshot(
                Request::post("/boards")
                    .header(header::COOKIE, cookie(&session.id))
                    .header(CSRF_HEADER_NAME, foreign.token.as_str())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!h.reached.load(Ordering::SeqCst));
        // The owner can still use it
        assert_eq!(h.store.csrf_count().await, 1);
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let h = harness().await;
        h.store
            .insert_session(Session::new("stale".into(), h.user_id, Utc::now(), -TimeDelta::seconds(1)))
            .await;

        let response = h
            .app
            .oneshot(
                Request::get("/me")
                    .header(header::COOKIE, cookie("stale"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_session_of_missing_user_is_unauthorized() {
        let h = harness().await;
        let session = h.state.auth.auth_user(UserId::new(999)).await.unwrap();

        let response = h
            .app
            .oneshot(
                Request::get("/me")
                    .header(header::COOKIE, cookie(&session.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[cfg(test)]
mod router_tests {
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, Response, StatusCode, header};
    use tower::ServiceExt;

    use crate::application::config::{AuthConfig, CSRF_HEADER_NAME, SESSION_COOKIE_NAME};
    use crate::infra::MemoryCredentialStore;
    use crate::presentation::{AuthAppState, auth_router};

    fn app(store: &MemoryCredentialStore) -> Router {
        auth_router(AuthAppState::new(
            store.clone(),
            AuthConfig::development().unwrap(),
        ))
    }

    fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn session_cookie(response: &Response<Body>) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn json_body(response: Response<Body>) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_signup_status_signout_flow() {
        let store = MemoryCredentialStore::new();

        let response = app(&store)
            .oneshot(json_post(
                "/signup",
                serde_json::json!({ "login": "Grace", "password": "hopper-1906" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let cookie = session_cookie(&response);
        assert!(cookie.starts_with(&format!("{SESSION_COOKIE_NAME}=")));
        let csrf = response
            .headers()
            .get(CSRF_HEADER_NAME)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(csrf.len(), 32);

        let body = json_body(response).await;
        assert_eq!(body["user"]["login"], "grace");
        assert_eq!(store.session_count().await, 1);
        assert_eq!(store.csrf_count().await, 1);

        let status = app(&store)
            .oneshot(
                Request::get("/status")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(json_body(status).await["authenticated"], true);

        let response = app(&store)
            .oneshot(
                Request::post("/signout")
                    .header(header::COOKIE, &cookie)
                    .header(CSRF_HEADER_NAME, &csrf)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(session_cookie(&response).ends_with('='));
        assert_eq!(store.session_count().await, 0);
        assert_eq!(store.csrf_count().await, 0);

        let status = app(&store)
            .oneshot(
                Request::get("/status")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(json_body(status).await["authenticated"], false);
    }

    #[tokio::test]
    async fn test_signin_and_wrong_password() {
        let store = MemoryCredentialStore::new();
        let signup = app(&store)
            .oneshot(json_post(
                "/signup",
                serde_json::json!({ "login": "linus", "password": "penguins-rule" }),
            ))
            .await
            .unwrap();
        assert_eq!(signup.status(), StatusCode::CREATED);

        let wrong = app(&store)
            .oneshot(json_post(
                "/signin",
                serde_json::json!({ "login": "linus", "password": "not-the-one" }),
            ))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(wrong).await["error_response"], "unauthorized");

        let right = app(&store)
            .oneshot(json_post(
                "/signin",
                serde_json::json!({ "login": "LINUS", "password": "penguins-rule" }),
            ))
            .await
            .unwrap();
        assert_eq!(right.status(), StatusCode::OK);
        assert!(right.headers().contains_key(CSRF_HEADER_NAME));
        assert_eq!(store.session_count().await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflicts() {
        let store = MemoryCredentialStore::new();
        let body = serde_json::json!({ "login": "dup", "password": "long-enough" });

        let first = app(&store).oneshot(json_post("/signup", body.clone())).await.unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app(&store).oneshot(json_post("/signup", body)).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_csrf_endpoint_requires_session() {
        let store = MemoryCredentialStore::new();

        let response = app(&store)
            .oneshot(Request::get("/csrf").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let signup = app(&store)
            .oneshot(json_post(
                "/signup",
                serde_json::json!({ "login": "barbara", "password": "liskov-subst" }),
            ))
            .await
            .unwrap();
        let cookie = session_cookie(&signup);

        let response = app(&store)
            .oneshot(
                Request::get("/csrf")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CSRF_HEADER_NAME).unwrap().len(), 32);
        assert_eq!(store.csrf_count().await, 2);
    }
}
