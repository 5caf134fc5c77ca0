//! Route constants shared by the router and the gate's exclusion policy.
//!
//! All paths are relative to the application base (see `ServerConfig::base`).

pub const API_PATH: &str = "/api/v1";

/// Login endpoint, served by the host's login flow. Never gated.
pub const AUTH_EXCLUDE_LOGIN_URL: &str = "/api/v1/auth/login";

/// Registration endpoint, served by the host's registration flow. Never gated.
pub const AUTH_EXCLUDE_REGISTER_URL: &str = "/api/v1/auth/register";
