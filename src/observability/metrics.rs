//! Metrics collection and exposition.
//!
//! # Metrics
//! - `scrape_admin_http_requests_total` (counter): requests by method, route, status
//! - `scrape_admin_http_request_duration_seconds` (histogram): handler latency
//! - `scrape_admin_reloads_total` (counter): collector reloads by outcome
//! - `scrape_admin_reload_duration_seconds` (histogram): reload latency
//! - `scrape_admin_managed_jobs` (gauge): jobs visible after the last request
//!
//! Without an installed exporter every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram, Label};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter HTTP listener. Needs a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = vec![
        Label::new("method", method.to_string()),
        Label::new("route", route.to_string()),
        Label::new("status", status.to_string()),
    ];
    counter!("scrape_admin_http_requests_total", labels.clone()).increment(1);
    histogram!("scrape_admin_http_request_duration_seconds", labels).record(start.elapsed().as_secs_f64());
}

pub fn record_reload(outcome: &'static str, start: Instant) {
    counter!("scrape_admin_reloads_total", "outcome" => outcome).increment(1);
    histogram!("scrape_admin_reload_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_managed_jobs(count: usize) {
    gauge!("scrape_admin_managed_jobs").set(count as f64);
}
