//! Startup orchestration.
//!
//! Expects logging to be initialized and the configuration to be validated
//! already; both happen in `main` so that configuration errors are reported
//! before anything binds.

use tokio::net::TcpListener;

use crate::config::GuardConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Bring the guard up and serve until a termination signal arrives.
pub async fn run(config: GuardConfig) -> Result<(), std::io::Error> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let mut serving = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let joined = tokio::select! {
        joined = &mut serving => joined,
        _ = signals::termination_signal() => {
            shutdown.trigger();
            serving.await
        }
    };
    joined.map_err(std::io::Error::other)?
}
