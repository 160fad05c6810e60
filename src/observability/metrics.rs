//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define server metrics (requests, latency, connections, transport failures)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, status
//! - `http_request_duration_seconds` (histogram): handler latency
//! - `http_connections_total` (counter): accepted connections
//! - `http_active_connections` (gauge): current connection count
//! - `http_transport_failures_total` (counter): connections closed on error, by kind
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Recording without an installed recorder is a no-op, so tests need no setup

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Outside a Tokio runtime the exporter runs on its own background thread.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// One handled request.
pub fn record_request(method: &str, status: u16, started: Instant) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_connection_opened() {
    metrics::counter!("http_connections_total").increment(1);
    metrics::gauge!("http_active_connections").increment(1.0);
}

pub fn record_connection_closed() {
    metrics::gauge!("http_active_connections").decrement(1.0);
}

/// A connection ended by an I/O, framing or timeout failure.
pub fn record_transport_failure(kind: &'static str) {
    metrics::counter!("http_transport_failures_total", "kind" => kind).increment(1);
}
