//! The credential a request presents, and the in-flight verification request.

use axum::http::HeaderMap;

use super::context::Principal;
use super::cookie::{ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, get_cookie};

/// Which credential cookie is consulted on this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Access(String),
    Refresh(String),
}

impl Credential {
    /// Select the authenticating credential. The access cookie takes
    /// precedence; the refresh cookie is only consulted without one.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        if let Some(token) = get_cookie(headers, ACCESS_COOKIE_NAME) {
            return Some(Credential::Access(token.into_owned()));
        }
        get_cookie(headers, REFRESH_COOKIE_NAME).map(|token| Credential::Refresh(token.into_owned()))
    }

    pub fn raw(&self) -> &str {
        match self {
            Credential::Access(token) | Credential::Refresh(token) => token,
        }
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Credential::Access(_) => "access",
            Credential::Refresh(_) => "refresh",
        }
    }
}

/// A raw credential paired with the identity verification produced, if any.
#[derive(Debug)]
pub struct AuthenticationRequest {
    credential: Credential,
    principal: Option<Principal>,
}

impl AuthenticationRequest {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            principal: None,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn complete(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    pub fn is_verified(&self) -> bool {
        self.principal.is_some()
    }

    pub fn into_principal(self) -> Option<Principal> {
        self.principal
    }
}
