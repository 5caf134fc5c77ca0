//! Credential cookies: parsing on the way in, `Set-Cookie` writes on the way out.

use std::borrow::Cow;

use axum::http::{HeaderMap, HeaderValue, header};

/// Cookie name for the access credential (short-lived).
pub const ACCESS_COOKIE_NAME: &str = "AUTH_JWT_TOKEN";

/// Cookie name for the refresh credential (long-lived).
pub const REFRESH_COOKIE_NAME: &str = "AUTH_JWT_REFRESH_TOKEN";

/// Extract a cookie value from the Cookie headers.
///
/// Headers are parsed as bytes: a sibling cookie with non-ASCII bytes must
/// not hide the one asked for. A matched value that is not UTF-8 is still
/// returned (lossily decoded) so that it fails verification instead of
/// reading as absent.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .flat_map(|value| value.as_bytes().split(|&b| b == b';'))
        .find_map(|pair| {
            let (key, value) = pair.split_at(pair.iter().position(|&b| b == b'=')?);
            (key.trim_ascii() == name.as_bytes())
                .then(|| String::from_utf8_lossy(value[1..].trim_ascii()))
        })
}

/// Attributes shared by every credential cookie the server writes.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    /// Add the `Secure` attribute (HTTPS deployments).
    pub secure: bool,
    /// Max-Age for a reissued access cookie, in seconds.
    pub access_max_age: u64,
}

impl CookieSettings {
    /// Format a `Set-Cookie` value.
    pub fn format(&self, name: &str, value: &str, max_age: u64) -> String {
        let secure = if self.secure { "; Secure" } else { "" };
        format!(
            "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{}",
            name, value, max_age, secure
        )
    }
}

/// Pending `Set-Cookie` writes for one response.
///
/// Writes are keyed by cookie name: a later write for the same name replaces
/// the earlier one, so the response carries at most one terminal header per
/// cookie no matter how often it was set.
#[derive(Debug, Clone)]
pub struct ResponseCookies {
    settings: CookieSettings,
    pending: Vec<(&'static str, String)>,
}

impl ResponseCookies {
    pub fn new(settings: CookieSettings) -> Self {
        Self {
            settings,
            pending: Vec::new(),
        }
    }

    pub fn set_cookie(&mut self, name: &'static str, value: &str, max_age: u64) {
        let formatted = self.settings.format(name, value, max_age);
        match self.pending.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = formatted,
            None => self.pending.push((name, formatted)),
        }
    }

    /// Overwrite a cookie with an empty value that expires immediately.
    pub fn clear_cookie(&mut self, name: &'static str) {
        self.set_cookie(name, "", 0);
    }

    /// Expire both credential cookies.
    pub fn clear_credentials(&mut self) {
        self.clear_cookie(ACCESS_COOKIE_NAME);
        self.clear_cookie(REFRESH_COOKIE_NAME);
    }

    /// Set the access cookie to a freshly issued token.
    pub fn issue_access(&mut self, token: &str) {
        let max_age = self.settings.access_max_age;
        self.set_cookie(ACCESS_COOKIE_NAME, token, max_age);
    }

    /// Append the pending writes to `headers`.
    ///
    /// A cookie the headers already set (e.g. a handler clearing it on
    /// logout) is left alone: the later decision wins.
    pub fn apply(self, headers: &mut HeaderMap) {
        for (name, value) in self.pending {
            if sets_cookie(headers, name) {
                continue;
            }
            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    headers.append(header::SET_COOKIE, value);
                }
                Err(e) => tracing::error!(cookie = name, error = %e, "Invalid Set-Cookie value"),
            }
        }
    }
}

/// Whether `headers` already carry a `Set-Cookie` for `name`.
fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.split_once('=').is_some_and(|(key, _)| key.trim() == name))
}
