mod auth;
mod error;
mod users;

use axum::Router;
use std::sync::Arc;

use crate::auth::CookieSettings;
use crate::db::Database;
use crate::jwt::JwtConfig;

pub use error::{ApiError, ResultExt};

/// Create the API router. Mounted at `routes::API_PATH`.
pub fn create_api_router(db: Database, jwt: Arc<JwtConfig>, cookies: CookieSettings) -> Router {
    let users_state = users::UsersState { db: db.clone() };

    let session_state = auth::SessionState { db, jwt, cookies };

    Router::new()
        .nest("/user", users::router(users_state))
        .nest("/auth", auth::router(session_state))
}
