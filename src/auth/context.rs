//! The verified identity and the request-scoped context holding it.

use std::collections::BTreeSet;
use std::future::Future;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;

use super::errors::NotAuthenticated;
use crate::db::User;
use crate::jwt::AccessClaims;

/// A verified identity plus its authorities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    /// User UUID (the token subject)
    pub subject: String,
    pub username: String,
    pub authorities: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, A>(subject: &str, username: &str, authorities: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            subject: subject.to_string(),
            username: username.to_string(),
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}

impl From<&AccessClaims> for Principal {
    fn from(claims: &AccessClaims) -> Self {
        Principal::new(
            &claims.sub,
            &claims.username,
            claims.role.authorities().iter().copied(),
        )
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Principal::new(
            &user.uuid,
            &user.username,
            user.role.authorities().iter().copied(),
        )
    }
}

tokio::task_local! {
    static CURRENT_PRINCIPAL: Principal;
}

/// Ambient, request-scoped holder of the current principal.
///
/// The principal is only visible inside the future passed to [`scope`],
/// so it is released on every exit path of that future and never leaks into
/// another request's task.
///
/// [`scope`]: SecurityContext::scope
pub struct SecurityContext;

impl SecurityContext {
    /// Run `f` with `principal` installed as the current principal.
    pub async fn scope<F: Future>(principal: Principal, f: F) -> F::Output {
        CURRENT_PRINCIPAL.scope(principal, f).await
    }

    /// The principal of the request being handled, if it authenticated.
    pub fn current() -> Option<Principal> {
        CURRENT_PRINCIPAL.try_with(Clone::clone).ok()
    }
}

/// Extractor for handlers that require an authenticated caller.
///
/// The gate never rejects anonymous requests itself; this is where a
/// protected route turns "no principal" into a 401.
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = NotAuthenticated;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .or_else(SecurityContext::current)
            .map(Authenticated)
            .ok_or(NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserRole;
    use crate::jwt::TokenType;

    fn alice() -> Principal {
        Principal::new("uuid-1", "alice", ["user"])
    }

    #[tokio::test]
    async fn test_context_visible_only_inside_scope() {
        assert!(SecurityContext::current().is_none());

        let seen = SecurityContext::scope(alice(), async { SecurityContext::current() }).await;
        assert_eq!(seen, Some(alice()));

        assert!(SecurityContext::current().is_none());
    }

    #[tokio::test]
    async fn test_context_not_shared_across_tasks() {
        let inner = SecurityContext::scope(alice(), async {
            tokio::spawn(async { SecurityContext::current() })
                .await
                .unwrap()
        })
        .await;

        assert!(inner.is_none());
    }

    #[test]
    fn test_principal_from_admin_claims() {
        let claims = AccessClaims {
            sub: "uuid-2".into(),
            username: "root".into(),
            role: UserRole::Admin,
            token_type: TokenType::Access,
            iat: 0,
            exp: 0,
        };

        let principal = Principal::from(&claims);
        assert_eq!(principal.subject, "uuid-2");
        assert!(principal.has_authority("admin"));
        assert!(principal.has_authority("user"));
    }
}
