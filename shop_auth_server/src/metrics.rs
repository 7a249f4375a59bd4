//! Prometheus metrics for the authentication service.
//!
//! When `METRICS_BIND` is set, a Prometheus exporter serves these at
//! `http://<addr>/metrics`. Without an installed recorder every call here
//! is a no-op.
//!
//! # Metrics
//!
//! - **HTTP**: request counts and durations by method, path and status
//! - **Auth**: registrations by outcome, login attempts, token refreshes,
//!   gate rejections by error kind
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use shop_auth_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/auth/login", 200);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
///
/// # Returns
///
/// Result indicating success or error message
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Auth Metrics
// ============================================================================

/// Increment registrations counter; `outcome` is `created` or an error kind.
pub fn registrations_total(outcome: &str) {
    metrics::counter!("registrations_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Increment login attempts counter.
pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// Increment token refresh counter.
pub fn token_refreshes_total(success: bool) {
    metrics::counter!("token_refreshes_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// Increment auth gate rejections by error kind.
pub fn gate_rejections_total(kind: &str) {
    metrics::counter!("gate_rejections_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}
