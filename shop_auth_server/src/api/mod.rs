//! HTTP API for the authentication service.
//!
//! # Modules
//!
//! - [`auth`]: registration, login, refresh, logout and profile handlers
//! - [`middleware`]: the auth gate for protected endpoints
//! - [`error`]: error kind to HTTP status mapping
//! - [`request_id`]: request correlation IDs
//!
//! # Endpoints Overview
//!
//! Every auth route is served at the root and again under `/api/v1`.
//!
//! ## Public
//! - `POST /auth/register` - Register a new account
//! - `POST /auth/login` - Login with email and password
//! - `POST /auth/refresh` - Exchange a refresh token for a new pair
//! - `POST /auth/logout` - Stateless acknowledgement
//!
//! ## Bearer access token required
//! - `GET /auth/profile` - Caller's profile
//! - `PUT /auth/profile` - Update the caller's display name
//!
//! ## Health checks (root only)
//! - `GET /health` - Liveness, no dependency checks
//! - `GET /ready` - Store answers within its timeout
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod auth;
pub mod error;
pub mod middleware;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use shop_auth::auth::{AuthGate, SessionService};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;

use crate::logging;

/// Service name reported by `/health`
pub const SERVICE_NAME: &str = "user-auth-service";

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to Arc wrappers). Holds no mutable
/// per-request data.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,
    pub gate: Arc<AuthGate>,
}

impl AppState {
    /// Build state around a session service, wiring the gate to its verifier
    pub fn new(sessions: SessionService) -> Self {
        let gate = AuthGate::new(sessions.verifier());
        Self {
            sessions: Arc::new(sessions),
            gate: Arc::new(gate),
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use shop_auth_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8001").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let root_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check));

    Router::new()
        .merge(root_routes)
        .merge(create_auth_router(state.clone()))
        .nest("/api/v1", create_auth_router(state.clone()))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Auth routes, mounted at the root and under `/api/v1`.
fn create_auth_router(state: AppState) -> Router<AppState> {
    // Public routes (no authentication middleware)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh_token))
        .route("/auth/logout", post(auth::logout));

    // Protected routes (require a bearer access token)
    let protected_routes = Router::new()
        .route(
            "/auth/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_gate,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Liveness check. Never touches the store.
///
/// ```bash
/// curl http://localhost:8001/health
/// # {"status":"healthy","service":"user-auth-service","timestamp":"2026-10-18T10:30:00Z"}
/// ```
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Readiness check: `200` if the store answers within its timeout, else `503`.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let result = state.sessions.ready().await;
    logging::log_store_operation("ping", started.elapsed().as_millis() as u64);

    match result {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not ready" })),
            )
        }
    }
}
