//! Metrics collection and exposition.
//!
//! # Metrics
//! - `zephyr_requests_total` (counter): requests by method, status
//! - `zephyr_request_duration_seconds` (histogram): dispatch latency by method
//! - `zephyr_rejections_total` (counter): middleware rejections by reason
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing when the exporter is off.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to install metrics exporter"),
    }
}

/// Record one dispatched request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    metrics::counter!(
        "zephyr_requests_total",
        "method" => method.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("zephyr_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

/// Record a request refused by middleware (`rate_limit`, `csrf`).
pub fn record_rejection(reason: &'static str) {
    metrics::counter!("zephyr_rejections_total", "reason" => reason).increment(1);
}
