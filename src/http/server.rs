//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the storefront handlers
//! - Wire up middleware (request ID, tracing, security pipeline, timeout)
//! - Bind the server to a listener and drain it on shutdown
//! - Sweep expired records out of the in-memory session backend
//!
//! # Layer Order (outermost first)
//! ```text
//! SetRequestId → Trace → PropagateRequestId → guard pipeline → Timeout → handlers
//! ```
//! The pipeline sits outside the timeout so that a 408 still carries the
//! security headers.

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{GuardConfig, StoreBackendKind};
use crate::http::pipeline::{guard_middleware, GuardState};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::session::{MemoryBackend, SessionBackend};
use crate::storefront;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Put `routes` behind the security pipeline.
pub fn protect(routes: Router, guard: GuardState) -> Router {
    routes.layer(middleware::from_fn_with_state(guard, guard_middleware))
}

/// HTTP server for the storefront.
pub struct HttpServer {
    router: Router,
    config: GuardConfig,
    sweeper: Option<MemoryBackend>,
}

impl HttpServer {
    /// Create a server using the backend named in the configuration.
    pub fn new(config: GuardConfig) -> Self {
        match config.store.backend {
            StoreBackendKind::Memory => {
                let backend = MemoryBackend::new();
                let mut server = Self::with_backend(config, Arc::new(backend.clone()));
                server.sweeper = Some(backend);
                server
            }
        }
    }

    /// Create a server on top of an externally provided session backend.
    pub fn with_backend(config: GuardConfig, backend: Arc<dyn SessionBackend>) -> Self {
        tracing::info!(backend = backend.name(), "Session backend selected");
        let guard = GuardState::new(&config, backend);
        let router = Self::build_router(&config, guard);
        Self {
            router,
            config,
            sweeper: None,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GuardConfig, guard: GuardState) -> Router {
        let routes = storefront::routes()
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        protect(routes, guard)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight
    /// requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if let Some(backend) = self.sweeper {
            tokio::spawn(sweep_expired(backend, shutdown.resubscribe()));
        }

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn sweep_expired(backend: MemoryBackend, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let purged = backend.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, remaining = backend.len(), "Swept expired sessions");
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::tests::session_config;
    use axum::{
        body::Body,
        http::{header::SET_COOKIE, Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    fn server() -> HttpServer {
        let mut config = GuardConfig::default();
        config.session = session_config();
        HttpServer::new(config)
    }

    #[tokio::test]
    async fn test_request_id_echoed() {
        let response = server()
            .router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key(SET_COOKIE));
    }

    #[tokio::test]
    async fn test_storefront_order_needs_token() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/order")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_storefront_forms_follow_configured_field() {
        let mut config = GuardConfig::default();
        config.session = session_config();
        config.csrf.form_field = "authenticity_token".to_string();
        let app = HttpServer::new(config).router();

        let page = app
            .clone()
            .oneshot(Request::builder().uri("/cart").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let raw_cookie = page.headers()[SET_COOKIE].to_str().unwrap().to_string();
        let cookie = raw_cookie.split(';').next().unwrap().to_string();
        let bytes = axum::body::to_bytes(page.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();

        let marker = "name=\"authenticity_token\" value=\"";
        assert!(!html.contains("name=\"_csrf\""));
        let start = html.find(marker).expect("form renders the configured field") + marker.len();
        let token = &html[start..start + html[start..].find('"').unwrap()];

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/order")
                    .header("cookie", cookie)
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from(format!("authenticity_token={}", token)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_shutdown_stops_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(server().run(listener, rx));

        tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }
}
