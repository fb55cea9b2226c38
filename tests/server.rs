//! End-to-end tests against a bound server
//!
//! Each test binds on an ephemeral localhost port, serves a scratch root
//! directory, and talks raw HTTP/1.1 over a TCP socket.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use devserve::config::Config;
use devserve::error::ServerError;
use devserve::server::Server;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;

const INDEX: &str = "<!doctype html><h1>Central de TI</h1>";

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Scratch directory under the system temp dir, removed on drop
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(label: &str) -> Self {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "devserve-it-{label}-{}-{n}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Write `contents` to `relative`, creating parent directories
    fn write(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let file = self.path.join(relative);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&file, contents).unwrap();
        file
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn site(label: &str) -> TempDir {
    let dir = TempDir::new(label);
    dir.write("index.html", INDEX.as_bytes());
    dir.write("css/style.css", b"body { margin: 0; }");
    dir.write("logo.png", &[0x89, b'P', b'N', b'G', 0, 1, 2, 255]);
    dir.write("docs/b.txt", b"b");
    dir.write("docs/A.txt", b"a");
    dir.write("docs/img/x.png", b"x");
    dir
}

/// Parsed response: status, lowercase header pairs, raw body
struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn assert_fixed_headers(&self) {
        let expected = [
            ("cache-control", "no-cache, no-store, must-revalidate"),
            ("pragma", "no-cache"),
            ("expires", "0"),
            ("access-control-allow-origin", "*"),
            ("access-control-allow-methods", "GET, POST, OPTIONS"),
            ("access-control-allow-headers", "Content-Type"),
        ];
        for (name, value) in expected {
            assert_eq!(self.header(name), Some(value), "header {name}");
        }
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

struct Running {
    addr: std::net::SocketAddr,
    shutdown: Arc<Notify>,
    site: TempDir,
}

impl Drop for Running {
    fn drop(&mut self) {
        self.shutdown.notify_one();
    }
}

fn local_config(root: &Path) -> Config {
    let mut config = Config::with_root(root);
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.logging.access_log = false;
    config.performance.read_timeout = 2;
    config
}

async fn start() -> Running {
    let site = site("server");
    let server = Server::bind(local_config(site.path())).unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = Arc::new(Notify::new());
    tokio::spawn(server.run(Arc::clone(&shutdown)));
    Running {
        addr,
        shutdown,
        site,
    }
}

/// Send raw request bytes on a fresh connection and read until close
async fn exchange(addr: std::net::SocketAddr, request: &[u8]) -> Reply {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut raw))
        .await
        .expect("server did not close the connection")
        .unwrap();

    parse_reply(&raw)
}

fn parse_reply(raw: &[u8]) -> Reply {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no header terminator");
    let head = std::str::from_utf8(&raw[..split]).unwrap();
    let body = raw[split + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap();
    let status = status_line.split(' ').nth(1).unwrap().parse().unwrap();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    Reply {
        status,
        headers,
        body,
    }
}

async fn get(addr: std::net::SocketAddr, path: &str) -> Reply {
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    exchange(addr, request.as_bytes()).await
}

async fn post(addr: std::net::SocketAddr, path: &str, body: &[u8]) -> Reply {
    let mut request = format!(
        "POST {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    request.extend_from_slice(body);
    exchange(addr, &request).await
}

#[tokio::test]
async fn files_are_served_byte_for_byte() {
    let running = start().await;

    for (path, file) in [
        ("/index.html", "index.html"),
        ("/css/style.css", "css/style.css"),
        ("/logo.png", "logo.png"),
    ] {
        let reply = get(running.addr, path).await;
        assert_eq!(reply.status, 200, "{path}");
        assert_eq!(reply.body, std::fs::read(running.site.path().join(file)).unwrap());
        reply.assert_fixed_headers();
    }

    assert_eq!(
        get(running.addr, "/css/style.css").await.header("content-type"),
        Some("text/css; charset=utf-8")
    );
    assert_eq!(
        get(running.addr, "/logo.png").await.header("content-type"),
        Some("image/png")
    );
}

#[tokio::test]
async fn root_matches_index() {
    let running = start().await;
    let root = get(running.addr, "/").await;
    let index = get(running.addr, "/index.html").await;

    assert_eq!(root.status, 200);
    assert_eq!(root.body, INDEX.as_bytes());
    assert_eq!(root.body, index.body);
    assert_eq!(root.header("content-type"), index.header("content-type"));
}

#[tokio::test]
async fn missing_file_is_empty_404() {
    let running = start().await;
    let reply = get(running.addr, "/does-not-exist.xyz").await;
    assert_eq!(reply.status, 404);
    assert!(reply.body.is_empty());
    reply.assert_fixed_headers();
}

#[tokio::test]
async fn traversal_stays_inside_root() {
    let running = start().await;
    for path in ["/../../etc/passwd", "/%2e%2e/%2e%2e/etc/passwd", "/css/../../index.html"] {
        let reply = get(running.addr, path).await;
        assert_eq!(reply.status, 404, "{path}");
        assert!(reply.body.is_empty(), "{path}");
    }
}

#[tokio::test]
async fn save_acknowledges_json() {
    let running = start().await;
    let reply = post(running.addr, "/api/save", br#"{"a":1}"#).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("content-type"), Some("application/json"));
    assert_eq!(reply.json(), serde_json::json!({"status": "success"}));
    reply.assert_fixed_headers();
}

#[tokio::test]
async fn save_rejects_invalid_json() {
    let running = start().await;
    let reply = post(running.addr, "/api/save", b"not json").await;
    assert_eq!(reply.status, 500);
    assert_eq!(reply.header("content-type"), Some("application/json"));
    let error = reply.json()["error"].as_str().unwrap().to_string();
    assert!(!error.is_empty());
    reply.assert_fixed_headers();
}

#[tokio::test]
async fn save_without_content_length_is_500() {
    let running = start().await;
    let reply = exchange(
        running.addr,
        b"POST /api/save HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert_eq!(reply.status, 500);
    assert_eq!(reply.json()["error"], "missing Content-Length header");
}

#[tokio::test]
async fn other_post_is_empty_404() {
    let running = start().await;
    let reply = post(running.addr, "/anything-else", br#"{"a":1}"#).await;
    assert_eq!(reply.status, 404);
    assert!(reply.body.is_empty());
    reply.assert_fixed_headers();
}

#[tokio::test]
async fn keep_alive_serves_sequential_requests() {
    let running = start().await;
    let mut stream = TcpStream::connect(running.addr).await.unwrap();
    stream
        .write_all(b"GET /css/style.css HTTP/1.1\r\nHost: localhost\r\n\r\nGET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut raw))
        .await
        .unwrap()
        .unwrap();
    let text = String::from_utf8_lossy(&raw);
    assert_eq!(text.matches("HTTP/1.1 200 OK").count(), 2);
    assert!(text.ends_with(INDEX));
}

#[tokio::test]
async fn second_server_on_same_port_fails() {
    let running = start().await;
    let other = TempDir::new("second");
    let mut config = local_config(other.path());
    config.server.port = running.addr.port();

    let err = Server::bind(config).unwrap_err();
    assert!(matches!(err, ServerError::Bind { .. }));
}

#[tokio::test]
async fn save_with_non_numeric_length_is_500() {
    let running = start().await;
    let reply = exchange(
        running.addr,
        b"POST /api/save HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: abc\r\n\r\n",
    )
    .await;
    assert_eq!(reply.status, 500);
    assert_eq!(reply.header("content-type"), Some("application/json"));
    assert_eq!(reply.json()["error"], "invalid Content-Length header: 'abc'");
    reply.assert_fixed_headers();
}

#[tokio::test]
async fn directory_without_index_is_listed() {
    let running = start().await;
    let reply = get(running.addr, "/docs/").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("content-type"), Some("text/html; charset=utf-8"));
    reply.assert_fixed_headers();

    let html = String::from_utf8(reply.body).unwrap();
    assert!(html.contains("<title>Directory listing for /docs/</title>"));
    let a = html.find(r#"<a href="A.txt">A.txt</a>"#).unwrap();
    let b = html.find(r#"<a href="b.txt">b.txt</a>"#).unwrap();
    let img = html.find(r#"<a href="img/">img/</a>"#).unwrap();
    assert!(a < b && b < img);
}

#[tokio::test]
async fn file_with_trailing_slash_is_404() {
    let running = start().await;
    let reply = get(running.addr, "/index.html/").await;
    assert_eq!(reply.status, 404);
    assert!(reply.body.is_empty());
}
