//! In-memory sequence allocator.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use itemstore_core::sequence::SequenceAllocator;
use itemstore_core::storage::{RepositoryError, Result};

/// Process-local named counters.
#[derive(Debug, Clone, Default)]
pub struct InMemorySequenceAllocator {
    counters: Arc<Mutex<HashMap<String, i64>>>,
}

impl InMemorySequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SequenceAllocator for InMemorySequenceAllocator {
    async fn increment(&self, key: &str, amount: i64) -> Result<i64> {
        let mut counters = self.counters.lock().await;
        let value = counters.entry(key.to_string()).or_insert(0);
        *value = value.checked_add(amount).ok_or_else(|| {
            RepositoryError::InvalidData(format!("sequence {key} overflowed"))
        })?;
        Ok(*value)
    }
}
