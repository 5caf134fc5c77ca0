//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::auth::REFRESH_COOKIE_NAME;
use crate::db::{Database, UserRole};
use crate::jwt::{DEFAULT_ACCESS_TOKEN_SECS, DEFAULT_REFRESH_TOKEN_SECS, JwtConfig};
use clap::Parser;
use tracing::{error, info};
use url::Url;
use uuid::Uuid;

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cookiegate",
    about = "API server behind a cookie-based JWT authentication gate"
)]
pub struct Args {
    /// Base path prefix the API is mounted under (e.g. "/app")
    #[arg(short, long, value_parser = validate_base_path)]
    pub base: Option<String>,

    /// Port to listen on
    #[arg(short, long, default_value = "7291")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "cookiegate.db")]
    pub database: String,

    /// Public origin of the server. HTTPS origins get Secure cookies
    #[arg(long, default_value = "http://localhost:7291")]
    pub origin: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, env = "ACCESS_TOKEN_TTL", default_value_t = DEFAULT_ACCESS_TOKEN_SECS)]
    pub access_ttl: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, env = "REFRESH_TOKEN_TTL", default_value_t = DEFAULT_REFRESH_TOKEN_SECS)]
    pub refresh_ttl: u64,

    /// Create a user with this name on startup and print a refresh cookie for it
    #[arg(long, value_name = "USERNAME")]
    pub create_user: Option<String>,

    /// Give the user created by --create-user the admin role
    #[arg(long, requires = "create_user")]
    pub admin: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

fn validate_base_path(s: &str) -> Result<String, String> {
    if s.is_empty() {
        return Ok(String::new());
    }

    if !s.starts_with('/') {
        return Err(format!("Base path must start with '/': {}", s));
    }

    if s.len() > 1 && s.ends_with('/') {
        return Err(format!("Base path must not end with '/': {}", s));
    }

    if s.chars().any(|c| !c.is_ascii() || c.is_whitespace()) {
        return Err(format!("Base path contains invalid characters: {}", s));
    }

    Ok(s.to_string())
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
///
/// Must run while the process is still single-threaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: only called from `main` before the tokio runtime is built,
        // so no other thread exists to read the environment concurrently.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Parse and validate the public origin.
/// Returns None and logs an error if validation fails.
pub fn validate_origin(origin: &str) -> Option<Url> {
    let url = match Url::parse(origin) {
        Ok(url) => url,
        Err(e) => {
            error!(origin = %origin, error = %e, "Invalid origin URL");
            return None;
        }
    };

    let is_https = url.scheme() == "https";
    let is_localhost = url.host_str() == Some("localhost");

    if !is_https && !is_localhost {
        error!("origin must use HTTPS for non-localhost deployments");
        return None;
    }

    Some(url)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, db: Database, origin: &Url, jwt_secret: String) -> ServerConfig {
    ServerConfig {
        base: args.base.clone().filter(|b| !b.is_empty()),
        db,
        jwt_secret: jwt_secret.into_bytes(),
        access_ttl: args.access_ttl,
        refresh_ttl: args.refresh_ttl,
        secure_cookies: origin.scheme() == "https",
    }
}

/// Handle the --create-user flag: create the user, record a refresh token for
/// it and print the cookie. Exits the process on failure.
pub async fn handle_create_user(db: &Database, jwt: &JwtConfig, username: &str, admin: bool) {
    let role = if admin { UserRole::Admin } else { UserRole::User };

    match db.users().get_by_username(username).await {
        Ok(Some(_)) => {
            error!(username = %username, "User already exists");
            std::process::exit(1);
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check for existing user");
            std::process::exit(1);
        }
    }

    let uuid = Uuid::new_v4().to_string();
    let user_id = match db.users().create(&uuid, username, role).await {
        Ok(id) => id,
        Err(e) => {
            error!(error = %e, "Failed to create user");
            std::process::exit(1);
        }
    };

    let refresh = match jwt.generate_refresh_token(&uuid, username, role) {
        Ok(refresh) => refresh,
        Err(e) => {
            error!(error = %e, "Failed to generate refresh token");
            std::process::exit(1);
        }
    };

    if let Err(e) = db
        .tokens()
        .create(&refresh.jti, user_id, refresh.issued_at, refresh.expires_at)
        .await
    {
        error!(error = %e, "Failed to record refresh token");
        std::process::exit(1);
    }

    info!(username = %username, role = role.as_str(), "User created");
    println!();
    println!("User created: {} ({})", username, role.as_str());
    println!("Cookie: {}={}", REFRESH_COOKIE_NAME, refresh.token);
    println!("Valid for {} seconds", jwt.refresh_duration());
    println!();
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_base_path() {
        assert_eq!(validate_base_path("").unwrap(), "");
        assert_eq!(validate_base_path("/app").unwrap(), "/app");
        assert!(validate_base_path("app").is_err());
        assert!(validate_base_path("/app/").is_err());
        assert!(validate_base_path("/my app").is_err());
    }

    #[test]
    fn test_load_jwt_secret_from_file() {
        let dir = std::env::temp_dir();
        let long = dir.join(format!("cookiegate-secret-{}", Uuid::new_v4()));
        let short = dir.join(format!("cookiegate-secret-{}", Uuid::new_v4()));
        std::fs::write(&long, format!("{}\n", "s".repeat(40))).unwrap();
        std::fs::write(&short, "too-short").unwrap();

        assert_eq!(
            load_jwt_secret(long.to_str()).as_deref(),
            Some("s".repeat(40).as_str())
        );
        assert!(load_jwt_secret(short.to_str()).is_none());
        assert!(load_jwt_secret(Some("/nonexistent/cookiegate-secret")).is_none());

        std::fs::remove_file(long).unwrap();
        std::fs::remove_file(short).unwrap();
    }

    #[test]
    fn test_validate_origin() {
        assert!(validate_origin("https://example.com").is_some());
        assert!(validate_origin("http://localhost:7291").is_some());
        assert!(validate_origin("http://example.com").is_none());
        assert!(validate_origin("not a url").is_none());
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["cookiegate"]).unwrap();
        assert_eq!(args.port, 7291);
        assert_eq!(args.access_ttl, DEFAULT_ACCESS_TOKEN_SECS);
        assert_eq!(args.refresh_ttl, DEFAULT_REFRESH_TOKEN_SECS);
        assert!(!args.admin);
    }

    #[test]
    fn test_admin_requires_create_user() {
        assert!(Args::try_parse_from(["cookiegate", "--admin"]).is_err());
        let args =
            Args::try_parse_from(["cookiegate", "--create-user", "alice", "--admin"]).unwrap();
        assert_eq!(args.create_user.as_deref(), Some("alice"));
        assert!(args.admin);
    }

    #[tokio::test]
    async fn test_build_config_secure_cookies_follow_origin() {
        let args = Args::try_parse_from(["cookiegate", "--base", "/app"]).unwrap();
        let db = Database::open(":memory:").await.unwrap();

        let https = Url::parse("https://example.com").unwrap();
        let config = build_config(&args, db.clone(), &https, "s".repeat(32));
        assert!(config.secure_cookies);
        assert_eq!(config.base.as_deref(), Some("/app"));

        let http = Url::parse("http://localhost").unwrap();
        let config = build_config(&args, db, &http, "s".repeat(32));
        assert!(!config.secure_cookies);
    }
}
