//! Metrics collection and exposition.
//!
//! # Metrics
//! - `directory_http_requests_total` (counter): inbound requests by method, path, status
//! - `directory_http_request_duration_seconds` (histogram): inbound latency
//! - `directory_upstream_responses_total` (counter): upstream responses by method, status
//! - `directory_upstream_duration_seconds` (histogram): per-attempt upstream latency
//! - `directory_upstream_failures_total` (counter): transport failures by kind
//! - `directory_upstream_retries_total` (counter): 429 retries
//! - `directory_cache_lookups_total` (counter): cache lookups by namespace, result
//! - `directory_cache_evictions_total` (counter): evicted entries by namespace
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use metrics::{counter, histogram, Label};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed inbound request.
pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    let labels = vec![
        Label::new("method", method.to_string()),
        Label::new("path", path.to_string()),
        Label::new("status", status.to_string()),
    ];
    counter!("directory_http_requests_total", labels.clone()).increment(1);
    histogram!("directory_http_request_duration_seconds", labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record one upstream attempt that produced a response.
pub fn record_upstream_response(method: &str, status: u16, start: Instant) {
    let labels = vec![
        Label::new("method", method.to_string()),
        Label::new("status", status.to_string()),
    ];
    counter!("directory_upstream_responses_total", labels.clone()).increment(1);
    histogram!("directory_upstream_duration_seconds", labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record an upstream attempt that failed below HTTP.
pub fn record_upstream_failure(kind: &'static str) {
    counter!("directory_upstream_failures_total", "kind" => kind).increment(1);
}

/// Record a backoff retry after a 429.
pub fn record_retry() {
    counter!("directory_upstream_retries_total").increment(1);
}

pub fn record_cache_lookup(namespace: &'static str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("directory_cache_lookups_total", "namespace" => namespace, "result" => result)
        .increment(1);
}

pub fn record_cache_eviction(namespace: &'static str, entries: usize) {
    counter!("directory_cache_evictions_total", "namespace" => namespace)
        .increment(entries as u64);
}

/// Axum middleware counting every inbound request by its route template.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&method, &path, response.status().as_u16(), start);
    response
}
