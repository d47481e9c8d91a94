//! Metrics collection and exposition.
//!
//! # Metrics
//! - `front_requests_total` (counter): requests by method, status
//! - `front_request_duration_seconds` (histogram): latency distribution
//! - `front_page_cache_lookups_total` (counter): hit / miss / error
//! - `front_page_cache_writes_total` (counter): ok / failed
//! - `front_redirects_total` (counter): locale / canonical
//! - `front_route_reloads_total` (counter): ok / failed
//! - `front_route_endpoints` (gauge): endpoints in the published table

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "front_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("front_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(outcome: &'static str) {
    counter!("front_page_cache_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_write(outcome: &'static str) {
    counter!("front_page_cache_writes_total", "outcome" => outcome).increment(1);
}

pub fn record_redirect(kind: &'static str) {
    counter!("front_redirects_total", "kind" => kind).increment(1);
}

pub fn record_route_reload(outcome: &'static str) {
    counter!("front_route_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_endpoint_count(count: usize) {
    gauge!("front_route_endpoints").set(count as f64);
}
