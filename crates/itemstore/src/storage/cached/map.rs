//! Cached map repository decorator.
//!
//! Wraps a `MapRepository` implementation with the cache-aside pattern.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use itemstore_core::auxmap::AuxMapEntry;
use itemstore_core::cache::{
    deserialize_map_entry, map_key, map_partition_pattern, serialize_map_entry, Cache,
};
use itemstore_core::storage::{MapRepository, Result};
use itemstore_core::time::{Clock, SystemClock};

/// Cached map repository decorator.
///
/// - **Reads**: check the cache first; on a miss fetch from the repository
///   and populate the cache
/// - **Writes**: persist to the repository, then invalidate
///
/// A cached entry is re-checked for expiry on every hit. An expired hit is
/// evicted and the read falls through to the repository. Cached entries never
/// outlive the entry's own `ExpiresAt`.
///
/// Every invalidation bumps a generation counter. A read only populates the
/// cache when no invalidation happened while it was fetching, so a write or
/// delete racing a miss never leaves the older row cached.
pub struct CachedMapRepository<R, C>
where
    R: MapRepository,
    C: Cache,
{
    repository: Arc<R>,
    cache: Arc<C>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    generation: AtomicU64,
}

impl<R, C> CachedMapRepository<R, C>
where
    R: MapRepository,
    C: Cache,
{
    /// Creates a new cached map repository on the system clock.
    pub fn new(repository: Arc<R>, cache: Arc<C>, ttl: Duration) -> Self {
        Self::with_clock(repository, cache, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<R>,
        cache: Arc<C>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            cache,
            ttl,
            clock,
            generation: AtomicU64::new(0),
        }
    }

    /// Evicts the cached copy of one entry.
    pub async fn invalidate(&self, id: i64, edge_id: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let cache_key = map_key(id, edge_id);
        if let Err(err) = self.cache.delete(&cache_key).await {
            tracing::warn!(map_id = id, edge_id, error = %err, "Failed to invalidate map cache");
        }
    }

    /// Evicts every cached entry sharing the hash `id`.
    pub async fn invalidate_partition(&self, id: i64) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Err(err) = self.cache.delete_pattern(&map_partition_pattern(id)).await {
            tracing::warn!(map_id = id, error = %err, "Failed to invalidate map partition cache");
        }
    }

    /// Caches `entry` read at `generation`, unless an invalidation has
    /// happened since.
    async fn populate(&self, cache_key: &str, entry: &AuxMapEntry, now: i64, generation: u64) {
        let ttl = self.cache_ttl_for(entry, now);
        if ttl.is_zero() || self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        let Ok(bytes) = serialize_map_entry(entry) else {
            return;
        };
        if let Err(err) = self.cache.set(cache_key, &bytes, Some(ttl)).await {
            tracing::warn!(map_id = entry.id, edge_id = %entry.edge_id, error = %err, "Failed to cache map entry");
            return;
        }

        // An invalidation that landed between the check and the set may have
        // run its delete before our set.
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::trace!(map_id = entry.id, edge_id = %entry.edge_id, "Map entry changed while caching");
            if let Err(err) = self.cache.delete(cache_key).await {
                tracing::warn!(map_id = entry.id, edge_id = %entry.edge_id, error = %err, "Failed to drop stale map entry");
            }
        }
    }

    fn cache_ttl_for(&self, entry: &AuxMapEntry, now: i64) -> Duration {
        match entry.seconds_remaining(now) {
            Some(remaining) => self.ttl.min(Duration::from_secs(remaining as u64)),
            None => self.ttl,
        }
    }
}

#[async_trait]
impl<R, C> MapRepository for CachedMapRepository<R, C>
where
    R: MapRepository + 'static,
    C: Cache + 'static,
{
    async fn put_map(&self, entry: &AuxMapEntry) -> Result<()> {
        self.repository.put_map(entry).await?;
        self.invalidate(entry.id, &entry.edge_id).await;

        tracing::debug!(map_id = entry.id, edge_id = %entry.edge_id, "Map entry written");
        Ok(())
    }

    async fn try_get_map(&self, id: i64, edge_id: &str) -> Result<Option<AuxMapEntry>> {
        let cache_key = map_key(id, edge_id);
        let now = self.clock.now_unix();

        if let Ok(Some(bytes)) = self.cache.get(&cache_key).await {
            match deserialize_map_entry(&bytes) {
                Ok(entry) if !entry.is_expired(now) => {
                    tracing::trace!(map_id = id, edge_id, "Cache hit for map entry");
                    return Ok(Some(entry));
                }
                Ok(_) => {
                    tracing::trace!(map_id = id, edge_id, "Cached map entry expired");
                    self.invalidate(id, edge_id).await;
                }
                Err(err) => {
                    tracing::warn!(map_id = id, edge_id, error = %err, "Cache map entry deserialization failed");
                }
            }
        }

        tracing::trace!(map_id = id, edge_id, "Cache miss for map entry");
        let generation = self.generation.load(Ordering::SeqCst);
        let entry = self.repository.try_get_map(id, edge_id).await?;

        if let Some(ref found) = entry {
            self.populate(&cache_key, found, now, generation).await;
        }

        Ok(entry)
    }

    async fn delete_map(&self, id: i64, edge_id: &str) -> Result<()> {
        self.repository.delete_map(id, edge_id).await?;
        self.invalidate(id, edge_id).await;

        tracing::debug!(map_id = id, edge_id, "Map entry deleted");
        Ok(())
    }
}
