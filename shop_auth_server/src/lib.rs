//! HTTP server for the shop authentication service.
//!
//! Exposes the [`shop_auth`] session service over axum, with the auth gate
//! as middleware, env-driven configuration, structured logging and
//! optional Prometheus metrics.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
