//! Authentication API handlers.
//!
//! This module provides HTTP REST endpoints for:
//! - Account registration with email, password and display name
//! - Login with email/password
//! - Token refresh (rotating refresh tokens)
//! - Logout (stateless acknowledgement)
//! - Reading and updating the caller's profile
//!
//! All endpoints return JSON; errors use the body shape described in
//! [`super::error`].
//!
//! # Examples
//!
//! Register a new account:
//! ```bash
//! curl -X POST http://localhost:8001/auth/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "ann@example.com", "password": "secret123", "name": "Ann"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:8001/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "ann@example.com", "password": "secret123"}'
//! ```

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use shop_auth::auth::{
    AccountId, AccountProfile, AuthContext, AuthError, LoginRequest, ProfileUpdate,
    RegisterRequest, TokenPair,
};

use super::AppState;
use super::error::ApiError;
use super::request_id::RequestId;
use crate::{logging, metrics};

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub account_id: AccountId,
    pub message: String,
}

#[derive(Deserialize)]
pub struct RefreshPayload {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a new account.
///
/// # Request Body
///
/// ```json
/// { "email": "ann@example.com", "password": "secret123", "name": "Ann" }
/// ```
///
/// # Response
///
/// `201 Created`:
/// ```json
/// { "account_id": "7f0c…", "message": "Account created" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: malformed email, password outside 8..=128 characters, empty name
/// - `409 Conflict`: email already registered
/// - `503 Service Unavailable`: store timed out, safe to retry
pub async fn register(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(request) = payload?;

    match state.sessions.register(request).await {
        Ok(account_id) => {
            metrics::registrations_total("created");
            Ok((
                StatusCode::CREATED,
                Json(RegisterResponse {
                    account_id,
                    message: "Account created".to_string(),
                }),
            ))
        }
        Err(e) => {
            metrics::registrations_total(e.kind());
            if matches!(e, AuthError::DuplicateAccount) {
                logging::log_security_event(
                    "duplicate_registration",
                    None,
                    Some(request_id.as_str()),
                    "Registration attempted for an existing email",
                );
            }
            Err(e.into())
        }
    }
}

/// Authenticate with email and password and receive a token pair.
///
/// # Response
///
/// `200 OK`:
/// ```json
/// {
///   "access_token": "eyJhbGciOiJIUzI1NiIs...",
///   "refresh_token": "eyJhbGciOiJIUzI1NiIs...",
///   "token_type": "Bearer",
///   "expires_in": 900
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: unknown email or wrong password (one error for both)
/// - `503 Service Unavailable`: store timed out, safe to retry
pub async fn login(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Json(request) = payload?;

    match state.sessions.login(request).await {
        Ok(pair) => {
            metrics::login_attempts_total(true);
            Ok(Json(pair))
        }
        Err(e) => {
            metrics::login_attempts_total(false);
            if matches!(e, AuthError::InvalidCredentials) {
                logging::log_security_event(
                    "failed_login",
                    None,
                    Some(request_id.as_str()),
                    "Invalid credentials",
                );
            }
            Err(e.into())
        }
    }
}

/// Exchange a refresh token for a fresh access/refresh pair.
///
/// # Request Body
///
/// ```json
/// { "refresh_token": "eyJhbGciOiJIUzI1NiIs..." }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: refresh token invalid, expired, or not a refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<RefreshPayload>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let Json(payload) = payload?;

    let result = state.sessions.refresh(&payload.refresh_token);
    metrics::token_refreshes_total(result.is_ok());
    Ok(Json(result?))
}

/// Acknowledge a logout.
///
/// Tokens are not stored server-side, so nothing is revoked; clients
/// discard their tokens. A leaked access token stays usable until it
/// expires.
pub async fn logout(State(state): State<AppState>) -> Json<MessageResponse> {
    state.sessions.logout();
    Json(MessageResponse {
        message: "Logged out".to_string(),
    })
}

/// Return the caller's profile. Requires a bearer access token.
///
/// # Errors
///
/// - `401 Unauthorized`: rejected by the auth gate
/// - `404 Not Found`: the token's account no longer exists
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    request_id: RequestId,
) -> Result<Json<AccountProfile>, ApiError> {
    let profile = state
        .sessions
        .profile(ctx.account_id)
        .await
        .inspect_err(|e| log_orphaned_token(e, &ctx, &request_id))?;
    Ok(Json(profile))
}

/// Update the caller's mutable profile fields and return the result.
///
/// # Request Body
///
/// ```json
/// { "name": "Annie" }
/// ```
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    request_id: RequestId,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<AccountProfile>, ApiError> {
    let Json(update) = payload?;
    let profile = state
        .sessions
        .update_profile(ctx.account_id, update)
        .await
        .inspect_err(|e| log_orphaned_token(e, &ctx, &request_id))?;
    tracing::info!(account_id = %ctx.account_id, "Profile updated");
    Ok(Json(profile))
}

/// A valid access token whose account no longer exists
fn log_orphaned_token(err: &AuthError, ctx: &AuthContext, request_id: &RequestId) {
    if matches!(err, AuthError::NotFound) {
        logging::log_security_event(
            "orphaned_token",
            Some(ctx.account_id),
            Some(request_id.as_str()),
            "Access token presented for an unknown account",
        );
    }
}
