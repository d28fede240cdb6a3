//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_dispatch_total` (counter): commands by operation, outcome
//! - `gateway_dispatch_duration_seconds` (histogram): dispatch latency
//! - `gateway_responses_total` (counter): responses by api id, status

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one dispatch and its latency.
pub fn record_dispatch(operation: &'static str, outcome: &'static str, start: Instant) {
    counter!("gateway_dispatch_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    histogram!("gateway_dispatch_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

/// Record one translated response.
pub fn record_response(api_id: &'static str, status: u16) {
    counter!("gateway_responses_total", "api" => api_id, "status" => status.to_string())
        .increment(1);
}
