//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_requests_total` (counter): requests by method, status
//! - `guard_request_duration_seconds` (histogram): pipeline latency
//! - `guard_sessions_created_total` (counter)
//! - `guard_sessions_expired_total` (counter): expired sessions found on resolve
//! - `guard_csrf_rejections_total` (counter): rejections by internal reason
//! - `guard_store_unavailable_total` (counter): backend errors and timeouts
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "guard_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("guard_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_session_created() {
    counter!("guard_sessions_created_total").increment(1);
}

pub fn record_session_expired() {
    counter!("guard_sessions_expired_total").increment(1);
}

pub fn record_csrf_rejection(reason: &'static str) {
    counter!("guard_csrf_rejections_total", "reason" => reason).increment(1);
}

pub fn record_store_unavailable() {
    counter!("guard_store_unavailable_total").increment(1);
}
