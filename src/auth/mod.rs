//! Cookie-based JWT authentication gate.
//!
//! Dual-token system: short-lived access tokens (stateless) and long-lived
//! refresh tokens (database-tracked). The gate verifies whichever credential
//! cookie is present, installs the principal for downstream handlers, and
//! reissues the access cookie when a request authenticates by refresh token.
//! Any verification failure becomes a 401 that expires both cookies.

mod context;
mod cookie;
mod credential;
mod errors;
mod exclusion;
mod gate;
mod verifier;

pub use context::{Authenticated, Principal, SecurityContext};
pub use cookie::{
    ACCESS_COOKIE_NAME, CookieSettings, REFRESH_COOKIE_NAME, ResponseCookies, get_cookie,
};
pub use credential::{AuthenticationRequest, Credential};
pub use errors::{AuthError, NotAuthenticated, REJECTION_MESSAGE, Rejection};
pub use exclusion::RouteExclusionSet;
pub use gate::{Gate, authenticate};
pub use verifier::{AuthOutcome, CredentialVerifier, JwtVerifier, Refreshed, verify};
