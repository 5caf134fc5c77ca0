//! User endpoints.
//!
//! - GET `/me` - The authenticated principal
//! - GET `/{id}` - A user by database ID (the user themselves or an admin)

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use super::error::{ApiError, ResultExt};
use crate::auth::{Authenticated, Principal};
use crate::db::{Database, User};

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
}

pub fn router(state: UsersState) -> Router {
    Router::new()
        .route("/me", get(current_user))
        .route("/{id}", get(get_user))
        .with_state(state)
}

async fn current_user(Authenticated(principal): Authenticated) -> Json<Principal> {
    Json(principal)
}

async fn get_user(
    State(state): State<UsersState>,
    Authenticated(principal): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let is_admin = principal.has_authority("admin");

    let user = state
        .db
        .users()
        .get_by_id(id)
        .await
        .or_unavailable("get user")?;

    // Non-admins get 403 for missing users too, so IDs cannot be probed.
    match user {
        Some(user) if is_admin || user.uuid == principal.subject => Ok(Json(user)),
        None if is_admin => Err(ApiError::NotFound("User not found")),
        _ => Err(ApiError::Forbidden("You can only view your own account")),
    }
}
