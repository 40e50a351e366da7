//! # Civitas Passkey Authentication Server
//!
//! Passwordless authentication for the Civitas personal data vault, built
//! on the WebAuthn standard: the server issues one-time challenges, the
//! user's authenticator signs them, and identity is established only after
//! the signed response verifies against the stored public key.

use civitas_auth::config::Config;
use civitas_auth::handlers::auth::*;
use civitas_auth::handlers::credentials::{delete_credential, list_credentials};
use civitas_auth::handlers::health::health_check;
use civitas_auth::handlers::users::get_current_user;
use civitas_auth::middleware;
use civitas_auth::state::AppState;
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,civitas_auth=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded: {:?}", config);

    let app_state = AppState::new(&config).await?;
    tracing::info!(rp_id = %config.rp_id, origin = %config.rp_origin, "Application state initialized");

    // Server-side sessions in SQLite; the session cookie only carries an ID.
    let session_store = SqliteStore::new(app_state.db.clone());
    session_store.migrate().await?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    // Restrict origins in production; Any is for local development.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routes behind the session guard.
    let protected_routes = Router::new()
        .route("/api/users/me", get(get_current_user))
        .route("/api/credentials", get(list_credentials))
        .route("/api/credentials/{id}", delete(delete_credential))
        .layer(axum_middleware::from_fn(middleware::auth::require_auth))
        .with_state(app_state.clone());

    let app = Router::new()
        .route("/health", get(health_check))
        // Registration ceremony
        .route("/api/auth/register/start", post(register_start))
        .route("/api/auth/register/finish", post(register_finish))
        // Authentication ceremony
        .route("/api/auth/authenticate/start", post(authenticate_start))
        .route("/api/auth/authenticate/finish", post(authenticate_finish))
        // Session management
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/session", get(session_info))
        .merge(protected_routes)
        .layer(session_layer)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let bind_addr = config.bind_address();
    tracing::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
