//! The served application over a real socket.

mod common;

use common::{ACCESS_TTL, REFRESH_TTL, TEST_SECRET};
use cookiegate::{ServerConfig, db::Database, init_cleanup, run_server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn get(addr: std::net::SocketAddr, path: &str, cookie: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: localhost\r\nCookie: {}\r\nConnection: close\r\n\r\n",
        path, cookie
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_run_server_serves_gated_app() {
    let db = Database::open(":memory:").await.unwrap();
    init_cleanup(&db).await;

    let config = ServerConfig {
        base: None,
        db,
        jwt_secret: TEST_SECRET.to_vec(),
        access_ttl: ACCESS_TTL,
        refresh_ttl: REFRESH_TTL,
        secure_cookies: true,
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(run_server(config, listener));

    let response = get(addr, "/api/v1/user/me", "AUTH_JWT_TOKEN=garbage").await;
    assert!(response.starts_with("HTTP/1.1 401"), "{}", response);
    assert!(response.contains("AUTH_JWT_TOKEN=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0; Secure"));
    assert!(response.contains("AUTH_JWT_REFRESH_TOKEN=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0; Secure"));

    let response = get(addr, "/api/v1/user/me", "theme=dark").await;
    assert!(response.starts_with("HTTP/1.1 401"), "{}", response);
    assert!(!response.to_ascii_lowercase().contains("set-cookie"));

    server.abort();
}
