pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod routes;

use api::create_api_router;
use auth::{CookieSettings, Gate, JwtVerifier, authenticate};
use axum::{Router, middleware};
use db::Database;
use jwt::JwtConfig;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Base path for the application (e.g., "/app")
    pub base: Option<String>,
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Access token lifetime in seconds
    pub access_ttl: u64,
    /// Refresh token lifetime in seconds
    pub refresh_ttl: u64,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
}

/// Create the application router with the given configuration.
///
/// Every route sits behind the authentication gate.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::with_durations(
        &config.jwt_secret,
        config.access_ttl,
        config.refresh_ttl,
    ));

    let cookies = CookieSettings {
        secure: config.secure_cookies,
        access_max_age: jwt.access_duration(),
    };

    let base = config
        .base
        .as_deref()
        .filter(|b| !b.is_empty() && *b != "/");

    let gate = Gate::new(JwtVerifier::new(jwt.clone(), config.db.clone()), cookies.clone())
        .with_base(base.map(str::to_string));

    let app = Router::new().nest(
        routes::API_PATH,
        create_api_router(config.db.clone(), jwt, cookies),
    );

    let app = match base {
        Some(base) => Router::new().nest(base, app),
        None => app,
    };

    app.layer(middleware::from_fn_with_state(
        gate,
        authenticate::<JwtVerifier>,
    ))
}

/// Run cleanup tasks and spawn background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(db: &Database) {
    cleanup::run_cleanup(db).await;
    cleanup::spawn_cleanup_scheduler(db.clone());
}

/// Serve the application on `listener` until the server exits.
/// Call `init_cleanup` first to purge expired tokens and start the scheduler.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}
