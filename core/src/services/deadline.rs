//! Deadlines for store calls on the request path.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::DomainError;

/// Run a store call under `timeout`.
///
/// Storage failures and timeouts both come back as [`DomainError::Transient`];
/// domain errors raised by the store itself (duplicates, conflicts) pass through.
pub async fn within<T, F>(timeout: Duration, operation: &'static str, call: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(DomainError::Internal { message })) => {
            warn!(operation, error = %message, "Store call failed");
            Err(DomainError::transient(format!("{} failed", operation)))
        }
        Ok(Err(err)) => Err(err),
        Err(_) => {
            warn!(operation, timeout_ms = timeout.as_millis() as u64, "Store call timed out");
            Err(DomainError::transient(format!("{} timed out", operation)))
        }
    }
}
