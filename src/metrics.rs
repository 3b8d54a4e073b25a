//! Prometheus metrics for application observability.
//!
//! Exposed on a dedicated listener when `METRICS_PORT` is non-zero.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `lamb_http_requests_total` - Requests served (labels: method, status)
//! - `lamb_upstream_requests_total` - Upstream calls (labels: provider, outcome)
//!
//! ## Histograms
//! - `lamb_http_request_duration_seconds` - Request latency (labels: method, status)
//! - `lamb_upstream_duration_seconds` - Upstream call latency (labels: provider)
//!
//! Recording functions are no-ops until [`init_metrics`] installs a recorder,
//! so tests can call them freely.

use std::net::SocketAddr;
use std::time::Instant;

use anyhow::Context;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "lamb_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "lamb_http_request_duration_seconds";
    pub const UPSTREAM_REQUESTS_TOTAL: &str = "lamb_upstream_requests_total";
    pub const UPSTREAM_DURATION_SECONDS: &str = "lamb_upstream_duration_seconds";
}

/// Install the Prometheus exporter and describe all metrics.
///
/// # Errors
///
/// Fails if the listener cannot be bound or a recorder is already installed.
pub fn init_metrics(metrics_addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    describe_counter!(names::HTTP_REQUESTS_TOTAL, "Total number of HTTP requests served");
    describe_histogram!(
        names::HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );
    describe_counter!(
        names::UPSTREAM_REQUESTS_TOTAL,
        "Total number of calls made to upstream providers"
    );
    describe_histogram!(
        names::UPSTREAM_DURATION_SECONDS,
        "Upstream provider call duration in seconds"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %format!("{e:#}"), "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record a served HTTP request.
pub fn record_request(method: &str, status: u16, duration_secs: f64) {
    let status = status.to_string();
    counter!(names::HTTP_REQUESTS_TOTAL, "method" => method.to_string(), "status" => status.clone())
        .increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, "method" => method.to_string(), "status" => status)
        .record(duration_secs);
}

/// Record one upstream call and its outcome.
pub fn record_upstream_request(provider: &'static str, outcome: &'static str, duration_secs: f64) {
    counter!(names::UPSTREAM_REQUESTS_TOTAL, "provider" => provider, "outcome" => outcome)
        .increment(1);
    histogram!(names::UPSTREAM_DURATION_SECONDS, "provider" => provider).record(duration_secs);
}

/// Middleware recording request count and latency.
///
/// Labels use the method and status only; paths carry user input (city
/// names) and would blow up label cardinality.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    record_request(
        &method,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}
