use async_trait::async_trait;

use crate::storage::Result;

use super::{GLOBAL_SEQUENCE_KEY, MIN_USER_DEFINED_OBJECT_ID};

/// Atomic named counters shared by every process using the store.
#[async_trait]
pub trait SequenceAllocator: Send + Sync {
    /// Atomically adds `amount` to the counter `key` and returns the new
    /// value. A missing counter starts at zero.
    async fn increment(&self, key: &str, amount: i64) -> Result<i64>;

    /// Issues the next global identifier.
    ///
    /// Never returns a value in the reserved range: if the counter has not
    /// been bootstrapped it is fast-forwarded first. Errors are returned to
    /// the caller as-is; no id is ever guessed.
    async fn next(&self) -> Result<i64> {
        let mut value = self.increment(GLOBAL_SEQUENCE_KEY, 1).await?;
        while value <= MIN_USER_DEFINED_OBJECT_ID {
            value = self
                .increment(GLOBAL_SEQUENCE_KEY, MIN_USER_DEFINED_OBJECT_ID - value + 1)
                .await?;
        }
        Ok(value)
    }
}

/// Moves the global counter past the reserved range on first run.
///
/// Returns the counter value afterwards. Safe to call repeatedly.
pub async fn bootstrap_global_sequence<S>(allocator: &S) -> Result<i64>
where
    S: SequenceAllocator + ?Sized,
{
    let current = allocator.increment(GLOBAL_SEQUENCE_KEY, 0).await?;
    if current >= MIN_USER_DEFINED_OBJECT_ID {
        return Ok(current);
    }
    allocator
        .increment(GLOBAL_SEQUENCE_KEY, MIN_USER_DEFINED_OBJECT_ID - current)
        .await
}
