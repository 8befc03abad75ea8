//! Shared utilities for end-to-end tests.

use std::net::SocketAddr;
use std::sync::Arc;

use storefront_guard::config::GuardConfig;
use storefront_guard::http::HttpServer;
use storefront_guard::lifecycle::Shutdown;
use storefront_guard::session::SessionBackend;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const SECRET: &str = "integration-secret-integration-secret";

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub fn config() -> GuardConfig {
    let mut config = GuardConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.session.secret = SECRET.to_string();
    config
}

pub async fn spawn(config: GuardConfig) -> TestServer {
    serve(HttpServer::new(config)).await
}

#[allow(dead_code)]
pub async fn spawn_with_backend(config: GuardConfig, backend: Arc<dyn SessionBackend>) -> TestServer {
    serve(HttpServer::with_backend(config, backend)).await
}

async fn serve(server: HttpServer) -> TestServer {
    let listener = TcpListener::bind(&server.config().listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Client that does not follow redirects and keeps no cookies; tests carry
/// the session cookie by hand.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// `name=value` of the response's session cookie, if one was set.
pub fn session_cookie(response: &reqwest::Response) -> Option<String> {
    let raw = response.headers().get("set-cookie")?.to_str().ok()?;
    raw.split(';').next().map(|pair| pair.trim().to_string())
}

/// First `_csrf` hidden input value in a rendered page.
pub fn form_token(html: &str) -> Option<String> {
    let marker = "name=\"_csrf\" value=\"";
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')?;
    Some(html[start..start + end].to_string())
}
