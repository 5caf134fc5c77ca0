//! The authentication gate: the middleware every request passes through
//! before reaching a handler.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use super::context::{Principal, SecurityContext};
use super::cookie::{CookieSettings, ResponseCookies};
use super::credential::Credential;
use super::errors::Rejection;
use super::exclusion::RouteExclusionSet;
use super::verifier::{AuthOutcome, CredentialVerifier, verify};

/// Gate configuration, shared by every request.
pub struct Gate<V> {
    verifier: Arc<V>,
    exclusions: Arc<RouteExclusionSet>,
    cookies: CookieSettings,
    base: Option<String>,
}

impl<V> Clone for Gate<V> {
    fn clone(&self) -> Self {
        Self {
            verifier: self.verifier.clone(),
            exclusions: self.exclusions.clone(),
            cookies: self.cookies.clone(),
            base: self.base.clone(),
        }
    }
}

impl<V: CredentialVerifier> Gate<V> {
    /// A gate with the default exclusions (login, register) and no base path.
    pub fn new(verifier: V, cookies: CookieSettings) -> Self {
        Self {
            verifier: Arc::new(verifier),
            exclusions: Arc::new(RouteExclusionSet::default()),
            cookies,
            base: None,
        }
    }

    pub fn with_exclusions(mut self, exclusions: RouteExclusionSet) -> Self {
        self.exclusions = Arc::new(exclusions);
        self
    }

    /// Base path the application is mounted under, e.g. "/app".
    pub fn with_base(mut self, base: Option<String>) -> Self {
        self.base = base.filter(|b| !b.is_empty() && b != "/");
        self
    }

    /// Strip the base path, giving the path within the application.
    pub fn path_within_application<'a>(&self, path: &'a str) -> &'a str {
        let Some(base) = self.base.as_deref() else {
            return path;
        };
        match path.strip_prefix(base) {
            Some("") => "/",
            Some(rest) if rest.starts_with('/') => rest,
            _ => path,
        }
    }
}

/// Middleware entry point.
///
/// ```ignore
/// let app = router.layer(middleware::from_fn_with_state(gate, authenticate::<JwtVerifier>));
/// ```
pub async fn authenticate<V: CredentialVerifier>(
    State(gate): State<Gate<V>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = gate
        .path_within_application(request.uri().path())
        .to_string();

    if gate.exclusions.is_excluded(&path) {
        return next.run(request).await;
    }

    // Only this gate installs a principal.
    request.extensions_mut().remove::<Principal>();

    let Some(credential) = Credential::from_headers(request.headers()) else {
        debug!(path = %path, "No credentials presented, passing request down");
        return next.run(request).await;
    };

    let credential_kind = credential.kind();
    debug!(path = %path, credential = credential_kind, "<Start> Authenticate user");

    match verify(gate.verifier.as_ref(), credential).await {
        AuthOutcome::Authenticated {
            principal,
            reissued_access,
        } => {
            debug!(
                path = %path,
                credential = credential_kind,
                subject = %principal.subject,
                "<End> Authenticate user"
            );

            let mut cookies = ResponseCookies::new(gate.cookies.clone());
            if let Some(token) = reissued_access.as_deref() {
                cookies.issue_access(token);
            }

            request.extensions_mut().insert(principal.clone());
            let mut response = SecurityContext::scope(principal, next.run(request)).await;
            cookies.apply(response.headers_mut());
            response
        }
        AuthOutcome::Rejected(e) => {
            error!(
                path = %path,
                credential = credential_kind,
                kind = e.kind(),
                error = %e,
                "Authentication failed"
            );
            Rejection::new(gate.cookies.clone()).into_response()
        }
    }
}
