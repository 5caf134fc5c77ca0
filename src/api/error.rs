//! Errors returned by API handlers.
//!
//! Authentication failures never reach this type: the gate rejects them
//! before a handler runs. What remains is authorization, lookups and storage.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    /// Storage failed; the detail is logged, not returned.
    #[error("Storage unavailable")]
    Unavailable,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Map a storage result into an [`ApiError`], logging the cause.
pub trait ResultExt<T> {
    fn or_unavailable(self, operation: &'static str) -> Result<T, ApiError>;
}

impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn or_unavailable(self, operation: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| {
            error!(operation, error = %e, "Storage error");
            ApiError::Unavailable
        })
    }
}
