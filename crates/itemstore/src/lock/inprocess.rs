//! In-process lock provider.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use itemstore_core::lock::{can_acquire, LockLease, LockProvider};
use itemstore_core::storage::{RepositoryError, Result};
use itemstore_core::time::{Clock, SystemClock};

/// Lease table scoped to the current process.
///
/// Clones share the same table. Expired leases stay in the table until they
/// are replaced or released.
#[derive(Clone)]
pub struct InProcessLockProvider {
    leases: Arc<Mutex<HashMap<String, LockLease>>>,
    clock: Arc<dyn Clock>,
}

impl Default for InProcessLockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InProcessLockProvider {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            leases: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }
}

#[async_trait]
impl LockProvider for InProcessLockProvider {
    async fn acquire(&self, key: &str, duration_seconds: i64) -> Result<Option<LockLease>> {
        if duration_seconds <= 0 {
            return Err(RepositoryError::InvalidData(format!(
                "lock duration must be positive, got {duration_seconds}"
            )));
        }

        let now = self.clock.now_unix();
        let mut leases = self.leases.lock().await;
        if !can_acquire(leases.get(key), now) {
            tracing::trace!(lock_key = key, "Lock busy");
            return Ok(None);
        }

        let lease = LockLease::new(key, duration_seconds, now);
        leases.insert(key.to_string(), lease.clone());
        tracing::debug!(lock_key = key, duration_seconds, "Lock acquired");
        Ok(Some(lease))
    }

    async fn heartbeat(&self, lease: &mut LockLease) -> Result<bool> {
        let now = self.clock.now_unix();
        let mut leases = self.leases.lock().await;
        match leases.get_mut(&lease.key) {
            Some(current) if current.same_grant(lease) && current.is_valid(now) => {
                *current = current.renewed(now);
                *lease = current.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, lease: &LockLease) -> Result<()> {
        let mut leases = self.leases.lock().await;
        if leases
            .get(&lease.key)
            .is_some_and(|current| current.same_grant(lease))
        {
            leases.remove(&lease.key);
            tracing::debug!(lock_key = %lease.key, "Lock released");
        }
        Ok(())
    }

    async fn get_lock(&self, key: &str) -> Result<Option<LockLease>> {
        let now = self.clock.now_unix();
        let leases = self.leases.lock().await;
        Ok(leases.get(key).filter(|lease| lease.is_valid(now)).cloned())
    }
}
