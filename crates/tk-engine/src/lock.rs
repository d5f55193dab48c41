//! Scoped execution under a lease lock.

use std::future::Future;

use tk_core::errors::LockError;
use tk_core::store::{LockKey, LockService};

/// Run `operation` while holding the lock for `key`.
///
/// The operation is bounded by whatever is left of the lease when it starts.
/// If it has not finished by then it is dropped and the call fails with
/// [`LockError::LeaseExpired`]; any store write already issued may still have
/// landed. The lease is released on every exit path.
///
/// # Errors
///
/// Returns the operation's own error, or a `LockError` (converted into `E`)
/// when acquisition fails, the lease runs out, or release fails after the
/// operation itself failed.
pub async fn execute_with_lock<T, E, F>(
    locks: &dyn LockService,
    key: &LockKey,
    operation: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>> + Send,
    E: From<LockError>,
{
    let lease = locks.acquire(key).await?;
    let lease_ms = u64::try_from(lease.lease.as_millis()).unwrap_or(u64::MAX);
    let outcome = tokio::time::timeout(lease.remaining(), operation).await;
    let released = locks.release(lease).await;

    match outcome {
        Err(_elapsed) => {
            tracing::warn!(%key, lease_ms, "critical section outlived its lease");
            Err(LockError::LeaseExpired {
                key: key.to_string(),
                lease_ms,
            }
            .into())
        }
        Ok(Ok(value)) => {
            if let Err(e) = released {
                tracing::warn!(%key, error = %e, "lock release failed after successful operation");
            }
            Ok(value)
        }
        Ok(Err(op_err)) => {
            if let Err(e) = released {
                tracing::warn!(%key, error = %e, "lock release failed after failed operation");
            }
            Err(op_err)
        }
    }
}
