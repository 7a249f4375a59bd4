//! Structured logging configuration.
//!
//! The library crate logs through the `log` facade; `init` installs a
//! `tracing` subscriber and bridges those records into it, so both end up
//! in one stream filtered by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize structured logging
///
/// Features:
/// - Configurable log levels via RUST_LOG env var
/// - `log` records from the library bridged into `tracing`
/// - Request ID correlation via the request middleware's fields
///
/// # Example
///
/// ```no_run
/// use shop_auth_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // Console layer
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // `init` also installs the `log` -> `tracing` bridge
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// Never pass passwords, hashes or raw tokens in `message`; use
/// [`crate::api::middleware::token_fingerprint`] for tokens.
///
/// # Example
///
/// ```
/// use shop_auth_server::logging::log_security_event;
///
/// log_security_event(
///     "failed_login",
///     None,
///     Some("6c1f0e2a-0b8e-4d43-9d5e-1f3f1b0c7a11"),
///     "Invalid credentials",
/// );
/// ```
pub fn log_security_event(
    event_type: &str,
    account_id: Option<uuid::Uuid>,
    request_id: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        account_id = ?account_id,
        request_id = request_id,
        "SECURITY: {}",
        message
    );
}

/// Log a store operation's duration, warning when it is slow
pub fn log_store_operation(operation: &str, duration_ms: u64) {
    if duration_ms > 100 {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            "Slow store operation detected"
        );
    } else {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            "Store operation"
        );
    }
}

/// Log API request/response
pub fn log_api_request(
    method: &str,
    path: &str,
    status_code: u16,
    duration_ms: u64,
    request_id: &str,
) {
    tracing::info!(
        request_id = request_id,
        http_method = method,
        http_path = path,
        http_status = status_code,
        duration_ms = duration_ms,
        "API request completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_security_event() {
        // Just ensure it doesn't panic
        log_security_event(
            "test_event",
            Some(uuid::Uuid::new_v4()),
            Some("req-1"),
            "Test message",
        );
        log_security_event("test_event", None, None, "Test message");
    }

    #[test]
    fn test_log_store_operation() {
        log_store_operation("ping", 5);
        log_store_operation("ping", 500);
    }

    #[test]
    fn test_log_api_request() {
        log_api_request("GET", "/auth/profile", 200, 45, "req-1");
        log_api_request("POST", "/auth/login", 401, 120, "req-2");
    }
}
