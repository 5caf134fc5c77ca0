//! Session endpoints.
//!
//! - POST `/logout` - Revoke the refresh token and clear both cookies
//!
//! Login and registration are served by the host application; the gate lets
//! them through unauthenticated.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use tracing::{info, warn};

use crate::auth::{CookieSettings, REFRESH_COOKIE_NAME, ResponseCookies, get_cookie};
use crate::db::Database;
use crate::jwt::JwtConfig;

#[derive(Clone)]
pub struct SessionState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    pub cookies: CookieSettings,
}

pub fn router(state: SessionState) -> Router {
    Router::new()
        .route("/logout", post(logout))
        .with_state(state)
}

async fn logout(State(state): State<SessionState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(refresh_token) = get_cookie(&headers, REFRESH_COOKIE_NAME) {
        if let Ok(claims) = state.jwt.validate_refresh_token(&refresh_token) {
            match state.db.tokens().delete_by_jti(&claims.jti).await {
                Ok(true) => info!(subject = %claims.sub, "Refresh token revoked"),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Failed to revoke refresh token"),
            }
        }
    }

    let mut cookies = ResponseCookies::new(state.cookies.clone());
    cookies.clear_credentials();

    let mut response = (
        StatusCode::OK,
        Json(serde_json::json!({ "success": true })),
    )
        .into_response();
    cookies.apply(response.headers_mut());
    response
}
