//! End-to-end tests against a real listening server.
//!
//! Each test serves its own temporary directory on an OS-assigned loopback
//! port and talks to it over plain TCP, HTTP, or HTTPS.
//!
//! Run with: cargo test --test serve

use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};
use std::path::Path;
use std::time::Duration;

use axum_server::Handle;
use lanserve::{Server, ServerConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const INDEX_HTML: &str = "<!DOCTYPE html><title>hud</title>";

fn served_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
    dir
}

fn plain_config(root: &Path) -> ServerConfig {
    ServerConfig::from_flags(false)
        .with_root(root)
        .with_bind_ip(LOOPBACK)
        .with_start_port(0)
}

/// Spawn the serve loop and wait until it accepts connections.
async fn start(server: Server) -> (SocketAddr, Handle) {
    let addr = server.local_addr();
    let handle = server.handle();
    tokio::spawn(server.serve());
    handle
        .listening()
        .await
        .expect("server stopped before listening");
    (addr, handle)
}

/// Client that never routes loopback traffic through an environment proxy.
fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn assert_no_cache(headers: &reqwest::header::HeaderMap) {
    assert_eq!(headers["cache-control"], "no-cache, no-store, must-revalidate");
    assert_eq!(headers["pragma"], "no-cache");
    assert_eq!(headers["expires"], "0");
}

/// Send a raw HTTP/1.1 GET and return everything the server sends back.
async fn raw_request(addr: SocketAddr, target: &str) -> Vec<u8> {
    raw_method_request(addr, "GET", target).await
}

async fn raw_method_request(addr: SocketAddr, method: &str, target: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        method, target
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response)).await;
    response
}

#[tokio::test]
async fn plain_mode_serves_file_with_no_cache_headers() {
    let dir = served_dir();
    let (addr, handle) = start(Server::bind(plain_config(dir.path())).unwrap()).await;

    let response = client()
        .get(format!("http://{}/index.html", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_no_cache(response.headers());
    assert_eq!(response.text().await.unwrap(), INDEX_HTML);

    handle.shutdown();
}

/// Occupy an ephemeral port whose successor is currently free.
fn occupy_port_with_free_successor() -> Option<(TcpListener, u16)> {
    for _ in 0..20 {
        let occupied = TcpListener::bind((LOOPBACK, 0)).unwrap();
        let taken = occupied.local_addr().unwrap().port();
        let Some(next) = taken.checked_add(1) else {
            continue;
        };
        if TcpListener::bind((LOOPBACK, next)).is_ok() {
            return Some((occupied, taken));
        }
    }
    None
}

#[tokio::test]
async fn occupied_start_port_moves_to_next_port() {
    let Some((occupied, taken)) = occupy_port_with_free_successor() else {
        return;
    };

    let dir = served_dir();
    let server = Server::bind(plain_config(dir.path()).with_start_port(taken)).unwrap();
    let port = server.port();
    assert_eq!(port, taken + 1);
    assert!(server
        .banner()
        .contains(&format!("http://localhost:{}?mode=server", port)));
    assert!(server
        .banner()
        .contains(&format!("http://localhost:{}?mode=hud", port)));

    let (addr, handle) = start(server).await;
    let response = client()
        .get(format!("http://{}/index.html", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_no_cache(response.headers());
    assert_eq!(response.bytes().await.unwrap(), INDEX_HTML.as_bytes());

    handle.shutdown();
    drop(occupied);
}

#[tokio::test]
async fn error_responses_carry_no_cache_headers() {
    let dir = served_dir();
    let (addr, handle) = start(Server::bind(plain_config(dir.path())).unwrap()).await;
    let client = client();

    let missing = client
        .get(format!("http://{}/missing.js", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
    assert_no_cache(missing.headers());

    let not_allowed = client
        .post(format!("http://{}/index.html", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(not_allowed.status(), 405);
    assert_no_cache(not_allowed.headers());

    handle.shutdown();
}

#[tokio::test]
async fn unknown_method_is_routed_and_carries_no_cache_headers() {
    let dir = served_dir();
    let (addr, handle) = start(Server::bind(plain_config(dir.path())).unwrap()).await;

    let response =
        String::from_utf8_lossy(&raw_method_request(addr, "BREW", "/index.html").await)
            .to_ascii_lowercase();
    assert!(response.starts_with("http/1.1 405"), "{}", response);
    assert!(response.contains("cache-control: no-cache, no-store, must-revalidate\r\n"));
    assert!(response.contains("pragma: no-cache\r\n"));
    assert!(response.contains("expires: 0\r\n"));

    handle.shutdown();
}

#[tokio::test]
async fn directory_listing_for_folder_without_index() {
    let dir = served_dir();
    fs::create_dir(dir.path().join("assets")).unwrap();
    fs::write(dir.path().join("assets").join("app.js"), "").unwrap();

    let (addr, handle) = start(Server::bind(plain_config(dir.path())).unwrap()).await;

    let response = client()
        .get(format!("http://{}/assets/", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_no_cache(response.headers());
    let body = response.text().await.unwrap();
    assert!(body.contains("Directory listing for /assets/"));
    assert!(body.contains(r#"<a href="app.js">app.js</a>"#));

    handle.shutdown();
}

#[tokio::test]
async fn parent_segments_do_not_escape_root() {
    let outer = tempfile::tempdir().unwrap();
    let root = outer.path().join("www");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("index.html"), INDEX_HTML).unwrap();
    fs::write(outer.path().join("secret.txt"), "top secret").unwrap();

    let (addr, handle) = start(Server::bind(plain_config(&root)).unwrap()).await;

    for target in ["/../secret.txt", "/%2e%2e/secret.txt", "/..%2fsecret.txt", "/../"] {
        let response = String::from_utf8_lossy(&raw_request(addr, target).await).into_owned();
        assert!(
            !response.contains("top secret"),
            "{} leaked a file outside the root",
            target
        );
        assert!(
            !response.starts_with("HTTP/1.1 200"),
            "{} answered {}",
            target,
            response.lines().next().unwrap_or_default()
        );
    }

    handle.shutdown();
}

#[tokio::test]
async fn tls_mode_generates_certificate_and_serves_https() {
    let dir = served_dir();
    let cert_path = dir.path().join("localhost.crt");
    let key_path = dir.path().join("localhost.key");
    assert!(!cert_path.exists());

    let config = ServerConfig::from_flags(true)
        .with_root(dir.path())
        .with_bind_ip(LOOPBACK)
        .with_start_port(0)
        .with_cert_paths(&cert_path, &key_path);
    let server = Server::bind(config).unwrap();

    // Pair exists before any connection is accepted
    assert!(cert_path.is_file());
    assert!(key_path.is_file());

    let (addr, handle) = start(server).await;

    let certificate = reqwest::Certificate::from_pem(&fs::read(&cert_path).unwrap()).unwrap();
    let client = reqwest::Client::builder()
        .no_proxy()
        .add_root_certificate(certificate)
        .resolve("localhost", addr)
        .build()
        .unwrap();

    let response = client
        .get(format!("https://localhost:{}/index.html", addr.port()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_no_cache(response.headers());
    assert_eq!(response.text().await.unwrap(), INDEX_HTML);

    handle.shutdown();
}

#[tokio::test]
async fn tls_port_refuses_plaintext_http() {
    let dir = served_dir();
    let config = ServerConfig::from_flags(true)
        .with_root(dir.path())
        .with_bind_ip(LOOPBACK)
        .with_start_port(0)
        .with_cert_paths(
            dir.path().join("localhost.crt"),
            dir.path().join("localhost.key"),
        );
    let (addr, handle) = start(Server::bind(config).unwrap()).await;

    let response = raw_request(addr, "/index.html").await;
    assert!(!response.starts_with(b"HTTP/"));
    assert!(!String::from_utf8_lossy(&response).contains(INDEX_HTML));

    handle.shutdown();
}

#[tokio::test]
async fn tls_mode_reuses_existing_certificate() {
    let dir = served_dir();
    let cert_path = dir.path().join("localhost.crt");
    let key_path = dir.path().join("localhost.key");
    let config = ServerConfig::from_flags(true)
        .with_root(dir.path())
        .with_bind_ip(LOOPBACK)
        .with_start_port(0)
        .with_cert_paths(&cert_path, &key_path);

    drop(Server::bind(config.clone()).unwrap());
    let first = fs::read(&cert_path).unwrap();

    drop(Server::bind(config).unwrap());
    assert_eq!(fs::read(&cert_path).unwrap(), first);
}
