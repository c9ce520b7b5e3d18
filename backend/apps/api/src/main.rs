//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use auth::domain::repository::SessionStore;
use auth::domain::value_object::Role;
use auth::presentation::SessionHandle;
use auth::{AuthConfig, PgAuthRepository, auth_router};
use axum::{
    Extension, Json, Router, http,
    http::{Method, header},
    routing::get,
};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

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

    // Database connection
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set in environment"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Auth configuration
    let auth_config = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        // In production forwarded headers are only honored from the
        // listed proxies
        let trusted_proxies = env::var("TRUSTED_PROXIES").ok().map(|list| {
            list.split(',')
                .filter_map(|ip| ip.trim().parse().ok())
                .collect()
        });
        AuthConfig {
            trusted_proxies,
            ..AuthConfig::default()
        }
    };

    // Startup cleanup: remove sessions older than the session lifetime
    // Errors here should not prevent server startup
    let repo = PgAuthRepository::new(pool.clone());
    let cutoff = chrono::Utc::now() - auth_config.session_lifetime_chrono();
    match repo.cleanup_expired(cutoff).await {
        Ok(sessions) => {
            tracing::info!(sessions_deleted = sessions, "Session cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session cleanup failed, continuing anyway");
        }
    }

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static(auth::presentation::CSRF_HEADER),
        ]))
        .allow_credentials(true);

    // Protected storefront areas: the role guard redirects anything
    // the access rules refuse
    let account_routes = auth::presentation::protect(
        Router::new().route("/account", get(account)),
        vec![Role::Customer],
    );
    let admin_routes = auth::presentation::protect(
        Router::new().route("/admin", get(admin)),
        vec![Role::Admin],
    );
    let protected = auth::presentation::with_session(
        account_routes.merge(admin_routes),
        Arc::new(repo.clone()),
        Arc::new(auth_config.clone()),
    );

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(repo, auth_config))
        .nest("/api", protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 31113));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// GET /api/account — any logged-in customer (or above)
async fn account(Extension(session): Extension<SessionHandle>) -> Json<serde_json::Value> {
    let ctx = session.0.lock().await;
    Json(serde_json::json!({
        "area": "account",
        "userId": ctx.record.user_id().map(|id| id.into_uuid()),
    }))
}

/// GET /api/admin — admins only
async fn admin(Extension(session): Extension<SessionHandle>) -> Json<serde_json::Value> {
    let ctx = session.0.lock().await;
    Json(serde_json::json!({
        "area": "admin",
        "userId": ctx.record.user_id().map(|id| id.into_uuid()),
    }))
}
