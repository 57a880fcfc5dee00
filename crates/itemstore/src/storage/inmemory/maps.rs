//! In-memory auxiliary map repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use itemstore_core::auxmap::AuxMapEntry;
use itemstore_core::storage::{MapRepository, Result};
use itemstore_core::time::{Clock, SystemClock};

/// In-memory mapping table.
///
/// Expired entries stay in the map until overwritten or deleted; readers
/// filter them out.
#[derive(Clone)]
pub struct InMemoryMapRepository {
    entries: Arc<RwLock<HashMap<(i64, String), AuxMapEntry>>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryMapRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMapRepository {
    /// Creates a new empty repository on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of stored rows, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl MapRepository for InMemoryMapRepository {
    async fn put_map(&self, entry: &AuxMapEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert((entry.id, entry.edge_id.clone()), entry.clone());
        Ok(())
    }

    async fn try_get_map(&self, id: i64, edge_id: &str) -> Result<Option<AuxMapEntry>> {
        let now = self.clock.now_unix();
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(id, edge_id.to_string()))
            .filter(|entry| !entry.is_expired(now))
            .cloned())
    }

    async fn delete_map(&self, id: i64, edge_id: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(&(id, edge_id.to_string()));
        Ok(())
    }
}
