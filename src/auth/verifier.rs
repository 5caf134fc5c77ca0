//! Credential verification: the capability the gate is generic over, the
//! single dispatch over [`Credential`], and the JWT + database implementation.

use std::future::Future;
use std::sync::Arc;

use super::context::Principal;
use super::credential::{AuthenticationRequest, Credential};
use super::errors::AuthError;
use crate::db::Database;
use crate::jwt::JwtConfig;

/// Result of verifying a refresh credential.
#[derive(Debug, Clone)]
pub struct Refreshed {
    pub principal: Principal,
    /// Newly minted access token
    pub access_token: String,
}

/// Verifies raw credential strings.
///
/// `Ok(None)` means the verifier declined to authenticate without an error;
/// [`verify`] treats it exactly like a failure.
pub trait CredentialVerifier: Send + Sync + 'static {
    fn verify_access(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<Principal>, AuthError>> + Send;

    fn verify_refresh(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<Refreshed>, AuthError>> + Send;
}

/// Outcome of one verification pass.
#[derive(Debug)]
pub enum AuthOutcome {
    Authenticated {
        principal: Principal,
        /// Set on the refresh path only.
        reissued_access: Option<String>,
    },
    Rejected(AuthError),
}

/// Verify a credential, dispatching on its variant.
pub async fn verify<V: CredentialVerifier>(verifier: &V, credential: Credential) -> AuthOutcome {
    let mut request = AuthenticationRequest::new(credential);

    if request.credential().raw().is_empty() {
        return AuthOutcome::Rejected(AuthError::Malformed);
    }

    let result = match request.credential() {
        Credential::Access(token) => verifier
            .verify_access(token)
            .await
            .map(|principal| principal.map(|p| (p, None))),
        Credential::Refresh(token) => verifier
            .verify_refresh(token)
            .await
            .map(|refreshed| refreshed.map(|r| (r.principal, Some(r.access_token)))),
    };

    let reissued_access = match result {
        Ok(Some((principal, reissued))) => {
            request.complete(principal);
            reissued
        }
        Ok(None) => None,
        Err(e) => return AuthOutcome::Rejected(e),
    };

    match request.into_principal() {
        Some(principal) => AuthOutcome::Authenticated {
            principal,
            reissued_access,
        },
        None => AuthOutcome::Rejected(AuthError::NotAuthenticated),
    }
}

/// Verifier backed by signed JWTs and the refresh-token table.
///
/// Access tokens are checked statelessly. Refresh tokens must also still be
/// recorded in the database and belong to an existing user.
#[derive(Clone)]
pub struct JwtVerifier {
    jwt: Arc<JwtConfig>,
    db: Database,
}

impl JwtVerifier {
    pub fn new(jwt: Arc<JwtConfig>, db: Database) -> Self {
        Self { jwt, db }
    }
}

impl CredentialVerifier for JwtVerifier {
    async fn verify_access(&self, token: &str) -> Result<Option<Principal>, AuthError> {
        let claims = self.jwt.validate_access_token(token)?;
        Ok(Some(Principal::from(&claims)))
    }

    async fn verify_refresh(&self, token: &str) -> Result<Option<Refreshed>, AuthError> {
        let claims = self.jwt.validate_refresh_token(token)?;

        self.db
            .tokens()
            .get_by_jti(&claims.jti)
            .await
            .map_err(|e| AuthError::Unavailable(format!("token lookup failed: {}", e)))?
            .ok_or(AuthError::Revoked)?;

        // Role and username come from the database, not the refresh claims,
        // so a role change takes effect on the next refresh.
        let user = self
            .db
            .users()
            .get_by_uuid(&claims.sub)
            .await
            .map_err(|e| AuthError::Unavailable(format!("user lookup failed: {}", e)))?
            .ok_or_else(|| AuthError::UnknownPrincipal(claims.sub.clone()))?;

        let access = self
            .jwt
            .generate_access_token(&user.uuid, &user.username, user.role)?;

        Ok(Some(Refreshed {
            principal: Principal::from(&user),
            access_token: access.token,
        }))
    }
}
