//! Authentication middleware for protected endpoints.
//!
//! The middleware reads the `Authorization: Bearer <token>` header, runs it
//! through the [`AuthGate`](shop_auth::auth::AuthGate), and on success
//! inserts an [`AuthContext`] into the request's extensions. The context
//! lives only as long as that request.
//!
//! # Extracting the caller
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use shop_auth::auth::AuthContext;
//!
//! async fn protected_handler(Extension(ctx): Extension<AuthContext>) -> String {
//!     format!("Authenticated as {}", ctx.email)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use shop_auth::auth::{AuthError, gate::bearer_token};

use super::AppState;
use super::error::ApiError;
use super::request_id::RequestId;
use crate::{logging, metrics};

/// Authentication middleware that validates access tokens and injects the caller.
///
/// # Behavior
///
/// - **Success**: injects [`AuthContext`](shop_auth::auth::AuthContext) and calls the next handler
/// - **Missing header or non-bearer scheme**: `401 missing_credential`
/// - **Expired token**: `401 token_expired`
/// - **Tampered, malformed or refresh token**: `401 invalid_token`
///
/// The downstream handler never runs on rejection.
pub async fn auth_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.gate.authenticate(header) {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            Ok(next.run(request).await)
        }
        Err(e) => {
            metrics::gate_rejections_total(e.kind());
            if !matches!(e, AuthError::MissingCredential) {
                let fingerprint = header.and_then(bearer_token).map(token_fingerprint);
                let request_id = request.extensions().get::<RequestId>();
                logging::log_security_event(
                    "token_rejected",
                    None,
                    request_id.map(RequestId::as_str),
                    &format!(
                        "{} (token {})",
                        e.kind(),
                        fingerprint.as_deref().unwrap_or("-")
                    ),
                );
            }
            Err(e.into())
        }
    }
}

/// Short, non-reversible identifier for a token, safe to log
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}
