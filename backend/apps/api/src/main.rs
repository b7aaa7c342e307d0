//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request errors render through
//! `auth::AuthError`.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use auth::{
    AuthAppState, AuthConfig, CredentialStore, MemoryCredentialStore, PgCredentialStore,
    StoreBackend, auth_router, config::CSRF_HEADER_NAME,
};
use axum::{
    Router, http,
    http::{HeaderName, Method, header},
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer, ExposeHeaders};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // An invalid session/CSRF configuration must stop startup
    let auth_config = AuthConfig::from_env().context("invalid auth configuration")?;
    tracing::info!(
        session_lifetime_secs = auth_config.session.duration().as_secs(),
        csrf_lifetime_secs = auth_config.csrf.duration().as_secs(),
        "Auth configuration loaded"
    );

    let backend: StoreBackend = match env::var("CREDENTIAL_STORE") {
        Ok(raw) => raw.parse()?,
        Err(_) => StoreBackend::default(),
    };
    let store = connect_store(backend).await?;

    // Startup cleanup: errors here should not prevent server startup
    if let Err(e) = store.cleanup_expired().await {
        tracing::warn!(error = %e, "Credential cleanup failed, continuing anyway");
    }
    spawn_cleanup(store.clone(), cleanup_interval()?);

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let csrf_header = HeaderName::from_static(CSRF_HEADER_NAME);

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            csrf_header.clone(),
        ]))
        .expose_headers(ExposeHeaders::list([csrf_header]))
        .allow_credentials(true);

    // Build router
    let state = AuthAppState::new(store, auth_config);
    let app = Router::new()
        .nest("/api/auth", auth_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()
        .context("BIND_ADDR is not a socket address")?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_store(backend: StoreBackend) -> anyhow::Result<CredentialStore> {
    match backend {
        StoreBackend::Postgres => {
            let database_url =
                env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;

            tracing::info!("Connected to database");

            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            Ok(CredentialStore::Postgres(PgCredentialStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory credential store; sessions are lost on restart");
            Ok(CredentialStore::Memory(MemoryCredentialStore::new()))
        }
    }
}

fn cleanup_interval() -> anyhow::Result<Duration> {
    let secs = match env::var("CLEANUP_INTERVAL_SECS") {
        Ok(raw) => raw
            .trim()
            .parse()
            .context("CLEANUP_INTERVAL_SECS is not a number")?,
        Err(_) => DEFAULT_CLEANUP_INTERVAL_SECS,
    };
    Ok(Duration::from_secs(secs.max(1)))
}

/// Periodic sweep of expired sessions and CSRF tokens
fn spawn_cleanup(store: CredentialStore, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately; startup already swept
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = store.cleanup_expired().await {
                tracing::warn!(error = %e, "Credential cleanup failed");
            }
        }
    });
}
