use async_trait::async_trait;

use crate::storage::Result;

use super::LockLease;

/// Acquire/heartbeat/release contract shared by the distributed and
/// in-process lock backends.
#[async_trait]
pub trait LockProvider: Send + Sync {
    /// Attempts to take `key` for `duration_seconds`.
    ///
    /// Returns `Ok(None)` when another caller holds a valid lease. Never
    /// blocks waiting for the holder.
    async fn acquire(&self, key: &str, duration_seconds: i64) -> Result<Option<LockLease>>;

    /// Extends `lease` from now. Returns `Ok(false)` when the caller no
    /// longer holds it; `lease` is only updated on success.
    async fn heartbeat(&self, lease: &mut LockLease) -> Result<bool>;

    /// Gives up `lease`. Releasing a lease someone else now holds does
    /// nothing.
    async fn release(&self, lease: &LockLease) -> Result<()>;

    /// The current valid lease on `key`, if any.
    async fn get_lock(&self, key: &str) -> Result<Option<LockLease>>;
}
