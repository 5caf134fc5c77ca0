//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::cookie::{CookieSettings, ResponseCookies};
use crate::jwt::JwtError;

/// Message returned to the client for every rejected credential. The
/// distinguishing detail only goes to the log.
pub const REJECTION_MESSAGE: &str = "Unable to authenticate User for provided credentials";

/// Why a presented credential failed verification.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("credential is empty or malformed")]
    Malformed,
    #[error("credential has expired")]
    Expired,
    #[error("credential signature does not match")]
    BadSignature,
    #[error("credential is of the wrong token type")]
    WrongTokenType,
    #[error("refresh credential has been revoked")]
    Revoked,
    #[error("no principal for subject {0}")]
    UnknownPrincipal(String),
    #[error("verifier did not produce an authenticated principal")]
    NotAuthenticated,
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Stable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Malformed => "malformed",
            AuthError::Expired => "expired",
            AuthError::BadSignature => "bad_signature",
            AuthError::WrongTokenType => "wrong_token_type",
            AuthError::Revoked => "revoked",
            AuthError::UnknownPrincipal(_) => "unknown_principal",
            AuthError::NotAuthenticated => "not_authenticated",
            AuthError::Unavailable(_) => "verifier_unavailable",
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        match e {
            JwtError::Expired => AuthError::Expired,
            JwtError::InvalidSignature => AuthError::BadSignature,
            JwtError::WrongTokenType => AuthError::WrongTokenType,
            JwtError::Decoding(_) => AuthError::Malformed,
            JwtError::Encoding(_) | JwtError::TimeError => AuthError::Unavailable(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

/// The gate's terminal response for a failed verification: 401 with both
/// credential cookies expired.
#[derive(Debug)]
pub struct Rejection {
    cookies: ResponseCookies,
}

impl Rejection {
    pub fn new(settings: CookieSettings) -> Self {
        let mut cookies = ResponseCookies::new(settings);
        cookies.clear_credentials();
        Self { cookies }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: REJECTION_MESSAGE,
            }),
        )
            .into_response();

        self.cookies.apply(response.headers_mut());
        response
    }
}

/// Rejection of the `Authenticated` extractor: the request carried no
/// verified principal. Cookies are left untouched.
#[derive(Debug)]
pub struct NotAuthenticated;

impl IntoResponse for NotAuthenticated {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Not authenticated",
            }),
        )
            .into_response()
    }
}
