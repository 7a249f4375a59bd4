//! Store call timeout helpers
//!
//! Every store call made on behalf of a request is bounded so a hung
//! backend surfaces as a retryable error instead of a stalled request.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use super::errors::{StoreError, StoreResult};

/// Default timeout for store calls (5 seconds)
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for schema setup at startup (30 seconds)
pub const SCHEMA_SETUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Execute a store call with timeout
///
/// # Arguments
///
/// * `duration` - Timeout duration
/// * `future` - Store operation to execute
///
/// # Returns
///
/// * `StoreResult<T>` - The call's own result, or `StoreError::Timeout`
///
/// # Example
///
/// ```no_run
/// use shop_auth::db::timeouts::{with_timeout, DEFAULT_STORE_TIMEOUT};
/// # use shop_auth::db::CredentialStore;
/// # async fn example(store: &dyn CredentialStore) -> Result<(), Box<dyn std::error::Error>> {
///
/// let account = with_timeout(DEFAULT_STORE_TIMEOUT, store.find_by_email("ann@example.com")).await?;
///
/// # Ok(())
/// # }
/// ```
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(duration)),
    }
}
