//! Credential store error types.

use std::time::Duration;
use thiserror::Error;

/// Credential store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint on email violated
    #[error("email already registered")]
    DuplicateEmail,

    /// Store call exceeded its deadline
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Store could not be reached (pool exhausted, connection refused)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure (bad schema, bad query, decode error)
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Transient failures are worth retrying with backoff; the rest are not
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Timeout(_) | StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation())
        {
            return StoreError::DuplicateEmail;
        }

        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
