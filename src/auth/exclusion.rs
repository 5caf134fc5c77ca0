//! Paths that bypass the authentication gate.

use std::collections::HashSet;

use crate::routes::{AUTH_EXCLUDE_LOGIN_URL, AUTH_EXCLUDE_REGISTER_URL};

/// Fixed set of application paths the gate never inspects.
///
/// Paths are matched exactly against the path within the application, so
/// `/api/v1/auth/login/` or `/api/v1/auth/login/extra` are still gated.
#[derive(Debug, Clone)]
pub struct RouteExclusionSet {
    paths: HashSet<String>,
}

impl RouteExclusionSet {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

impl Default for RouteExclusionSet {
    /// The login and registration endpoints.
    fn default() -> Self {
        Self::new([AUTH_EXCLUDE_LOGIN_URL, AUTH_EXCLUDE_REGISTER_URL])
    }
}
