//! Authentication error types.

use thiserror::Error;

use crate::db::StoreError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input the caller can correct
    #[error("{0}")]
    Validation(String),

    /// Email already registered
    #[error("An account with this email already exists")]
    DuplicateAccount,

    /// Unknown email or wrong password (one error for both)
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Token failed signature, structure or kind checks
    #[error("Invalid token")]
    InvalidToken,

    /// Token signature is valid but its lifetime is over
    #[error("Token has expired")]
    TokenExpired,

    /// No bearer credential on a protected request
    #[error("Missing bearer credential")]
    MissingCredential,

    /// Account not found
    #[error("Account not found")]
    NotFound,

    /// Transient store failure, safe to retry with backoff
    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),

    /// Invalid startup configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "validation_error",
            AuthError::DuplicateAccount => "duplicate_account",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InvalidToken => "invalid_token",
            AuthError::TokenExpired => "token_expired",
            AuthError::MissingCredential => "missing_credential",
            AuthError::NotFound => "not_found",
            AuthError::StoreUnavailable(_) => "store_unavailable",
            AuthError::Configuration(_) | AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Store, configuration and internal errors are sanitized so driver
    /// output never reaches the caller.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::StoreUnavailable(_) => {
                "Service temporarily unavailable, please retry".to_string()
            }
            AuthError::Configuration(_) | AuthError::Internal(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::StoreUnavailable(_))
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::DuplicateAccount,
            transient if transient.is_transient() => {
                AuthError::StoreUnavailable(transient.to_string())
            }
            other => AuthError::Internal(other.to_string()),
        }
    }
}

/// Reasons a token fails verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Token structure or claims could not be parsed
    #[error("malformed token")]
    MalformedToken,

    /// Signature mismatch or unexpected signing algorithm
    #[error("bad token signature")]
    BadSignature,

    /// Current time is at or past the `exp` claim
    #[error("token expired")]
    Expired,
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_store_timeout_is_retryable() {
        let err: AuthError = StoreError::Timeout(Duration::from_secs(5)).into();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
        assert!(err.is_retryable());
        assert_eq!(err.kind(), "store_unavailable");
    }

    #[test]
    fn test_duplicate_email_maps_to_duplicate_account() {
        let err: AuthError = StoreError::DuplicateEmail.into();
        assert!(matches!(err, AuthError::DuplicateAccount));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_backend_error_is_terminal_and_sanitized() {
        let err: AuthError =
            StoreError::Backend("relation \"accounts\" does not exist".to_string()).into();
        assert!(matches!(err, AuthError::Internal(_)));
        assert_eq!(err.client_message(), "Internal server error");
        assert!(!err.client_message().contains("accounts"));
    }

    #[test]
    fn test_unavailable_message_hides_driver_detail() {
        let err = AuthError::StoreUnavailable("connection refused (os error 111)".to_string());
        assert!(!err.client_message().contains("os error"));
    }
}
