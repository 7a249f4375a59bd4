//! Mapping from service errors to HTTP responses.
//!
//! Every error body has the same shape:
//!
//! ```json
//! { "error": "invalid_credentials", "message": "Invalid email or password" }
//! ```

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shop_auth::auth::AuthError;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

/// An `AuthError` on its way out of a handler
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::DuplicateAccount => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::MissingCredential => StatusCode::UNAUTHORIZED,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Configuration(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AuthError::Validation(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            // Full detail stays in the logs; the body gets the sanitized message
            tracing::error!(error = %self.0, kind = self.0.kind(), "Request failed");
        }

        let body = ErrorResponse {
            error: self.0.kind(),
            message: self.0.client_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AuthError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AuthError::DuplicateAccount, StatusCode::CONFLICT),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AuthError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AuthError::MissingCredential, StatusCode::UNAUTHORIZED),
            (AuthError::NotFound, StatusCode::NOT_FOUND),
            (
                AuthError::StoreUnavailable("timeout".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AuthError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let response =
            ApiError(AuthError::StoreUnavailable("pool timed out on 10.0.0.5".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
