use std::future::Future;
use std::time::Duration;

use storage::repository::StorageError;

/// Run one storage call, failing with `StorageError::Timeout` once `limit` elapses.
pub(crate) async fn bounded<T>(
    limit: Duration,
    op: impl Future<Output = Result<T, StorageError>>,
) -> Result<T, StorageError> {
    tokio::time::timeout(limit, op)
        .await
        .map_err(|_| StorageError::Timeout(limit))?
}
