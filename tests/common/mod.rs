#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use cookiegate::{ServerConfig, create_app, db::Database, db::UserRole, jwt::JwtConfig};
use tower::ServiceExt;

pub const TEST_SECRET: &[u8] = b"test-jwt-secret-for-testing-0123456789";
pub const ACCESS_TTL: u64 = 300;
pub const REFRESH_TTL: u64 = 3600;

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub jwt: JwtConfig,
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with_base(None).await
}

pub async fn create_test_app_with_base(base: Option<&str>) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        base: base.map(str::to_string),
        db: db.clone(),
        jwt_secret: TEST_SECRET.to_vec(),
        access_ttl: ACCESS_TTL,
        refresh_ttl: REFRESH_TTL,
        secure_cookies: false,
    };
    TestApp {
        app: create_app(&config),
        db,
        jwt: JwtConfig::with_durations(TEST_SECRET, ACCESS_TTL, REFRESH_TTL),
    }
}

/// A user with a recorded refresh token.
pub struct TestUser {
    pub id: i64,
    pub uuid: String,
    pub access: String,
    pub refresh: String,
    pub jti: String,
}

pub async fn create_user(test: &TestApp, username: &str, role: UserRole) -> TestUser {
    let uuid = uuid::Uuid::new_v4().to_string();
    let id = test.db.users().create(&uuid, username, role).await.unwrap();

    let access = test
        .jwt
        .generate_access_token(&uuid, username, role)
        .unwrap();
    let refresh = test
        .jwt
        .generate_refresh_token(&uuid, username, role)
        .unwrap();
    test.db
        .tokens()
        .create(&refresh.jti, id, refresh.issued_at, refresh.expires_at)
        .await
        .unwrap();

    TestUser {
        id,
        uuid,
        access: access.token,
        refresh: refresh.token,
        jti: refresh.jti,
    }
}

pub fn access_cookie(token: &str) -> String {
    format!("AUTH_JWT_TOKEN={}", token)
}

pub fn refresh_cookie(token: &str) -> String {
    format!("AUTH_JWT_REFRESH_TOKEN={}", token)
}

pub fn both_cookies(access: &str, refresh: &str) -> String {
    format!("AUTH_JWT_TOKEN={}; AUTH_JWT_REFRESH_TOKEN={}", access, refresh)
}

/// Send a request through the router. `cookie` is the raw Cookie header.
pub async fn send(app: &Router, method: &str, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Check if cookies contain `cookie_name` being cleared (empty value, Max-Age=0)
pub fn has_cleared_cookie(cookies: &[String], cookie_name: &str) -> bool {
    let prefix = format!("{}=;", cookie_name);
    cookies
        .iter()
        .any(|c| c.starts_with(&prefix) && c.contains("Max-Age=0"))
}

/// The value of a newly issued access cookie, if any
pub fn new_access_token(cookies: &[String]) -> Option<String> {
    cookies.iter().find_map(|c| {
        let value = c.strip_prefix("AUTH_JWT_TOKEN=")?.split(';').next()?;
        (!value.is_empty()).then(|| value.to_string())
    })
}

pub fn assert_rejected(status: StatusCode, cookies: &[String]) {
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(cookies.len(), 2, "expected exactly two Set-Cookie headers");
    assert!(has_cleared_cookie(cookies, "AUTH_JWT_TOKEN"));
    assert!(has_cleared_cookie(cookies, "AUTH_JWT_REFRESH_TOKEN"));
}
