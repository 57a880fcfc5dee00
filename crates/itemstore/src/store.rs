//! The application-facing storage service.
//!
//! [`ItemStore`] ties the repositories, the sequence allocator and the lock
//! provider together behind one object built from explicit configuration.
//! Every operation runs under the configured deadline; a write that times
//! out may or may not have been applied and must be re-read.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use itemstore_core::auxmap::AuxMapEntry;
use itemstore_core::item::{
    build_item, validate_new_item, validate_update, AuditStamp, Item, ItemError, ItemKey,
    ItemPayload, ItemTypeId, ItemUpdate, NewItem, Precondition, TypeRegistry,
};
use itemstore_core::lock::{LockLease, LockProvider};
use itemstore_core::sequence::SequenceAllocator;
use itemstore_core::storage::{
    IndexQuery, ItemRepository, MapRepository, RepositoryError, Result,
};
use itemstore_core::time::{Clock, SystemClock};

use crate::config::StoreConfig;
use crate::lock::{check_renewable, LockGuard};

/// Outcome of a first-writer-wins registration.
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    /// This caller wrote the row.
    Created(Item),
    /// Another caller got there first; carries the winning row.
    AlreadyClaimed(Item),
}

impl Registration {
    pub fn item(&self) -> &Item {
        match self {
            Self::Created(item) | Self::AlreadyClaimed(item) => item,
        }
    }

    pub fn into_item(self) -> Item {
        match self {
            Self::Created(item) | Self::AlreadyClaimed(item) => item,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Entity storage service.
#[derive(Clone)]
pub struct ItemStore {
    items: Arc<dyn ItemRepository>,
    maps: Arc<dyn MapRepository>,
    sequence: Arc<dyn SequenceAllocator>,
    locks: Arc<dyn LockProvider>,
    types: Arc<TypeRegistry>,
    clock: Arc<dyn Clock>,
    operation_timeout: Duration,
    lock_duration_seconds: i64,
}

impl ItemStore {
    pub fn new(
        items: Arc<dyn ItemRepository>,
        maps: Arc<dyn MapRepository>,
        sequence: Arc<dyn SequenceAllocator>,
        locks: Arc<dyn LockProvider>,
        types: TypeRegistry,
        config: &StoreConfig,
    ) -> Self {
        Self {
            items,
            maps,
            sequence,
            locks,
            types: Arc::new(types),
            clock: Arc::new(SystemClock),
            operation_timeout: config.operation_timeout(),
            lock_duration_seconds: config.lock_duration_seconds,
        }
    }

    /// Replaces the clock used for audit timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Process-local store: in-memory tables, cached maps, in-process locks.
    #[cfg(feature = "inmemory")]
    pub fn in_memory(types: TypeRegistry, config: &StoreConfig) -> Self {
        Self::in_memory_with_clock(types, config, Arc::new(SystemClock))
    }

    /// Process-local store whose expiry and audit arithmetic follow `clock`.
    #[cfg(feature = "inmemory")]
    pub fn in_memory_with_clock(
        types: TypeRegistry,
        config: &StoreConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        use crate::cache::MemoryCache;
        use crate::lock::InProcessLockProvider;
        use crate::storage::cached::CachedMapRepository;
        use crate::storage::inmemory::{
            InMemoryItemRepository, InMemoryMapRepository, InMemorySequenceAllocator,
        };

        let maps = CachedMapRepository::with_clock(
            Arc::new(InMemoryMapRepository::with_clock(clock.clone())),
            Arc::new(MemoryCache::new(config.map_cache_max_entries)),
            config.map_cache_ttl(),
            clock.clone(),
        );
        Self::new(
            Arc::new(InMemoryItemRepository::new()),
            Arc::new(maps),
            Arc::new(InMemorySequenceAllocator::new()),
            Arc::new(InProcessLockProvider::with_clock(clock.clone())),
            types,
            config,
        )
        .with_clock(clock)
    }

    /// Store backed by DynamoDB tables named after `config.table_prefix`.
    #[cfg(feature = "dynamodb")]
    pub async fn dynamodb(types: TypeRegistry, config: &StoreConfig) -> Self {
        use crate::cache::MemoryCache;
        use crate::storage::cached::CachedMapRepository;
        use crate::storage::dynamodb::{
            create_client, DynamoDbItemRepository, DynamoDbLockProvider, DynamoDbMapRepository,
            DynamoDbSequenceAllocator,
        };

        let client = create_client(config).await;
        let tables = config.tables();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let maps = CachedMapRepository::with_clock(
            Arc::new(DynamoDbMapRepository::new(
                client.clone(),
                tables.maps_table(),
                clock.clone(),
            )),
            Arc::new(MemoryCache::new(config.map_cache_max_entries)),
            config.map_cache_ttl(),
            clock.clone(),
        );
        Self::new(
            Arc::new(DynamoDbItemRepository::new(client.clone(), tables.items_table())),
            Arc::new(maps),
            Arc::new(DynamoDbSequenceAllocator::new(
                client.clone(),
                tables.sequences_table(),
            )),
            Arc::new(DynamoDbLockProvider::new(
                client,
                tables.locks_table(),
                clock.clone(),
            )),
            types,
            config,
        )
        .with_clock(clock)
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    fn stamp(&self, by_user_id: i64, by_workspace_id: i64) -> AuditStamp {
        AuditStamp::new(by_user_id, by_workspace_id, self.clock.now_unix())
    }

    async fn bounded<T, F>(&self, operation: &'static str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.operation_timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, timeout = ?self.operation_timeout, "Store operation timed out");
                Err(RepositoryError::Timeout(format!(
                    "{operation} exceeded {:?}",
                    self.operation_timeout
                )))
            }
        }
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// Validates, assigns an id if needed, and persists a new item.
    ///
    /// Schema violations are reported before the allocator or the table is
    /// touched. Returns the row as stored.
    pub async fn create_item(&self, new: NewItem) -> Result<Item> {
        let item = self.prepare(new).await?;
        self.bounded("create_item", self.items.create_item(&item))
            .await?;

        tracing::debug!(item = %item.key(), type_id = %item.type_id, "Item created");
        Ok(item)
    }

    async fn prepare(&self, new: NewItem) -> Result<Item> {
        validate_new_item(&new)?;
        self.types.validate(new.type_id, &new.payload)?;

        let id = match new.id {
            Some(id) => id,
            None => self.next_id().await?,
        };
        Ok(build_item(new, id, self.clock.now_unix())?)
    }

    /// First-writer-wins creation of an item with a deterministic key.
    ///
    /// The item must carry an explicit id. A loser receives the row that won.
    pub async fn register_once(&self, new: NewItem) -> Result<Registration> {
        if new.id.is_none() {
            return Err(ItemError::MissingField("Id").into());
        }
        let item = self.prepare(new).await?;

        match self.bounded("register_once", self.items.create_item(&item)).await {
            Ok(()) => {
                tracing::debug!(item = %item.key(), "Item registered");
                Ok(Registration::Created(item))
            }
            Err(RepositoryError::AlreadyExists { entity_type, id }) => {
                match self.get_item(item.id, &item.edge_id).await? {
                    Some(winner) => {
                        tracing::debug!(item = %item.key(), "Item already claimed");
                        Ok(Registration::AlreadyClaimed(winner))
                    }
                    None => Err(RepositoryError::AlreadyExists { entity_type, id }),
                }
            }
            Err(err) => Err(err),
        }
    }

    pub async fn get_item(&self, id: i64, edge_id: &str) -> Result<Option<Item>> {
        self.bounded("get_item", self.items.get_item(id, edge_id))
            .await
    }

    /// Gets an item and decodes its payload as `P`.
    pub async fn get_payload<P: ItemPayload>(&self, id: i64, edge_id: &str) -> Result<Option<P>> {
        match self.get_item(id, edge_id).await? {
            Some(item) => Ok(Some(item.decode_payload::<P>()?)),
            None => Ok(None),
        }
    }

    /// Reads through one of the index projections.
    ///
    /// Index reads may lag the canonical row; use [`get_item`](Self::get_item)
    /// when the latest write must be visible.
    pub async fn get_items_by_index(&self, query: &IndexQuery) -> Result<Vec<Item>> {
        self.bounded("get_items_by_index", self.items.query_index(query))
            .await
    }

    /// Applies `update` if `precondition` holds. `Ok(false)` means another
    /// writer changed the row first; re-read to see its state.
    ///
    /// A malformed update is rejected before the repository is touched.
    pub async fn update_item(
        &self,
        id: i64,
        edge_id: &str,
        update: &ItemUpdate,
        by_user_id: i64,
        by_workspace_id: i64,
        precondition: Option<&Precondition>,
    ) -> Result<bool> {
        validate_update(update)?;

        let stamp = self.stamp(by_user_id, by_workspace_id);
        let applied = self
            .bounded(
                "update_item",
                self.items
                    .update_item(id, edge_id, update, &stamp, precondition),
            )
            .await?;

        tracing::debug!(id, edge_id, applied, "Item update");
        Ok(applied)
    }

    pub async fn soft_delete_item(
        &self,
        id: i64,
        edge_id: &str,
        by_user_id: i64,
        by_workspace_id: i64,
    ) -> Result<bool> {
        let stamp = self.stamp(by_user_id, by_workspace_id);
        let deleted = self
            .bounded(
                "soft_delete_item",
                self.items.soft_delete_item(id, edge_id, &stamp),
            )
            .await?;

        tracing::debug!(id, edge_id, deleted, "Item soft delete");
        Ok(deleted)
    }

    /// Administrative undelete.
    pub async fn restore_item(
        &self,
        id: i64,
        edge_id: &str,
        by_user_id: i64,
        by_workspace_id: i64,
    ) -> Result<bool> {
        let stamp = self.stamp(by_user_id, by_workspace_id);
        let restored = self
            .bounded("restore_item", self.items.restore_item(id, edge_id, &stamp))
            .await?;

        tracing::debug!(id, edge_id, restored, "Item restore");
        Ok(restored)
    }

    /// Moves an item to a new owner and workspace.
    pub async fn transfer_ownership(
        &self,
        id: i64,
        edge_id: &str,
        owner_id: i64,
        workspace_id: i64,
        by_user_id: i64,
        by_workspace_id: i64,
    ) -> Result<bool> {
        for (field, value) in [("OwnerId", owner_id), ("WorkspaceId", workspace_id)] {
            if value <= 0 {
                return Err(ItemError::InvalidField {
                    field,
                    reason: format!("must be positive, got {value}"),
                }
                .into());
            }
        }

        let stamp = self.stamp(by_user_id, by_workspace_id);
        let transferred = self
            .bounded(
                "transfer_ownership",
                self.items
                    .transfer_ownership(id, edge_id, owner_id, workspace_id, &stamp),
            )
            .await?;

        tracing::debug!(id, edge_id, owner_id, workspace_id, transferred, "Item transfer");
        Ok(transferred)
    }

    // ========================================================================
    // Maps
    // ========================================================================

    pub async fn put_map(&self, entry: &AuxMapEntry) -> Result<()> {
        self.bounded("put_map", self.maps.put_map(entry)).await
    }

    pub async fn try_get_map(&self, id: i64, edge_id: &str) -> Result<Option<AuxMapEntry>> {
        self.bounded("try_get_map", self.maps.try_get_map(id, edge_id))
            .await
    }

    pub async fn delete_map(&self, id: i64, edge_id: &str) -> Result<()> {
        self.bounded("delete_map", self.maps.delete_map(id, edge_id))
            .await
    }

    /// Maps `external_key` of kind `type_id` to `target`, optionally expiring.
    pub async fn map_external_key(
        &self,
        type_id: ItemTypeId,
        external_key: &str,
        target: &ItemKey,
        expires_at: Option<i64>,
    ) -> Result<AuxMapEntry> {
        let entry =
            AuxMapEntry::new(type_id, external_key, target).expiring_at(expires_at.unwrap_or(0));
        self.put_map(&entry).await?;
        Ok(entry)
    }

    /// Hashes `external_key` and fetches its live entry.
    pub async fn resolve_map(
        &self,
        type_id: ItemTypeId,
        external_key: &str,
    ) -> Result<Option<AuxMapEntry>> {
        let key = AuxMapEntry::key_for(type_id, external_key);
        self.try_get_map(key.id, &key.edge_id).await
    }

    /// Resolves `external_key` all the way to the item it points at.
    pub async fn resolve_item(
        &self,
        type_id: ItemTypeId,
        external_key: &str,
    ) -> Result<Option<Item>> {
        match self.resolve_map(type_id, external_key).await? {
            Some(entry) => {
                let target = entry.target();
                self.get_item(target.id, &target.edge_id).await
            }
            None => Ok(None),
        }
    }

    // ========================================================================
    // Locks
    // ========================================================================

    /// Attempts to take `key`; `Ok(None)` when busy. Uses the configured
    /// lease length when `duration_seconds` is `None`.
    pub async fn acquire_lock(
        &self,
        key: &str,
        duration_seconds: Option<i64>,
    ) -> Result<Option<LockLease>> {
        let duration = duration_seconds.unwrap_or(self.lock_duration_seconds);
        self.bounded("acquire_lock", self.locks.acquire(key, duration))
            .await
    }

    pub async fn heartbeat(&self, lease: &mut LockLease) -> Result<bool> {
        self.bounded("heartbeat", self.locks.heartbeat(lease)).await
    }

    pub async fn release_lock(&self, lease: &LockLease) -> Result<()> {
        self.bounded("release_lock", self.locks.release(lease))
            .await
    }

    pub async fn get_lock(&self, key: &str) -> Result<Option<LockLease>> {
        self.bounded("get_lock", self.locks.get_lock(key)).await
    }

    /// Acquires `key` and keeps it renewed until the guard is released.
    pub async fn lock(
        &self,
        key: &str,
        duration_seconds: Option<i64>,
    ) -> Result<Option<LockGuard<dyn LockProvider>>> {
        check_renewable(duration_seconds.unwrap_or(self.lock_duration_seconds))?;
        Ok(self
            .acquire_lock(key, duration_seconds)
            .await?
            .map(|lease| LockGuard::spawn(self.locks.clone(), lease)))
    }

    // ========================================================================
    // Sequences
    // ========================================================================

    /// Issues the next identifier from the global sequence.
    pub async fn next_id(&self) -> Result<i64> {
        self.bounded("next_id", self.sequence.next()).await
    }

    pub async fn increment(&self, key: &str, amount: i64) -> Result<i64> {
        self.bounded("increment", self.sequence.increment(key, amount))
            .await
    }
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use std::collections::HashSet;

    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    use itemstore_core::item::{encode_payload, ItemField};
    use itemstore_core::sequence::{GLOBAL_SEQUENCE_KEY, MIN_USER_DEFINED_OBJECT_ID};
    use itemstore_core::storage::{IndexName, RangeCondition};
    use itemstore_core::time::ManualClock;

    use super::*;
    use crate::lock::InProcessLockProvider;
    use crate::storage::inmemory::{InMemoryMapRepository, InMemorySequenceAllocator};

    const NOTE: ItemTypeId = ItemTypeId(7);
    const API_KEY: ItemTypeId = ItemTypeId(21);
    const USER: ItemTypeId = ItemTypeId(1);

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct ApiKey {
        label: String,
    }

    impl ItemPayload for ApiKey {
        const TYPE_ID: ItemTypeId = API_KEY;
        const NAME: &'static str = "ApiKey";
    }

    fn types() -> TypeRegistry {
        TypeRegistry::new()
            .register::<ApiKey>()
            .register_untyped(NOTE, "Note")
            .register_untyped(USER, "User")
    }

    fn store() -> (ManualClock, ItemStore) {
        let clock = ManualClock::new(1_700_000_000);
        let store =
            ItemStore::in_memory_with_clock(types(), &StoreConfig::default(), Arc::new(clock.clone()));
        (clock, store)
    }

    fn note() -> NewItem {
        NewItem::new(NOTE).owned_by(100_001, 100_002)
    }

    #[tokio::test]
    async fn test_create_then_get_returns_submitted_fields() {
        let (_, store) = store();
        let new = note().with_status("draft").with_attribute("body", "hello");

        let created = store.create_item(new).await.unwrap();
        let fetched = store
            .get_item(created.id, &created.edge_id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fetched, created);
        assert!(fetched.id > MIN_USER_DEFINED_OBJECT_ID);
        assert_eq!(fetched.status_id.as_deref(), Some("draft"));
        assert_eq!(fetched.payload["body"], "hello");
        assert_eq!(fetched.created_on_utc, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_duplicate_key_fails_instead_of_overwriting() {
        let (_, store) = store();
        store
            .create_item(note().with_id(200_000).with_status("first"))
            .await
            .unwrap();

        let result = store
            .create_item(note().with_id(200_000).with_status("second"))
            .await;

        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
        let stored = store.get_item(200_000, "7|200000").await.unwrap().unwrap();
        assert_eq!(stored.status_id.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_missing_workspace_is_rejected_before_any_write() {
        let (_, store) = store();
        let mut new = note();
        new.workspace_id = None;

        let result = store.create_item(new).await;

        assert_eq!(
            result,
            Err(RepositoryError::SchemaViolation(ItemError::MissingField(
                "WorkspaceId"
            )))
        );
        // The allocator was never consulted.
        assert_eq!(store.increment(GLOBAL_SEQUENCE_KEY, 0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_type_and_bad_payload_are_schema_violations() {
        let (_, store) = store();

        let unknown = NewItem::new(ItemTypeId(99)).owned_by(1, 2);
        assert!(matches!(
            store.create_item(unknown).await,
            Err(RepositoryError::SchemaViolation(ItemError::UnknownType(_)))
        ));

        let bad = NewItem::new(API_KEY)
            .owned_by(1, 2)
            .with_attribute("label", 42);
        assert!(matches!(
            store.create_item(bad).await,
            Err(RepositoryError::SchemaViolation(ItemError::InvalidPayload { .. }))
        ));
    }

    #[tokio::test]
    async fn test_typed_payload_round_trip() {
        let (_, store) = store();
        let key = ApiKey {
            label: "ci".to_string(),
        };
        let created = store
            .create_item(
                NewItem::new(API_KEY)
                    .owned_by(100_001, 100_002)
                    .with_payload(encode_payload(&key).unwrap()),
            )
            .await
            .unwrap();

        let decoded: Option<ApiKey> = store
            .get_payload(created.id, &created.edge_id)
            .await
            .unwrap();
        assert_eq!(decoded, Some(key));
    }

    #[tokio::test]
    async fn test_id_index_scenario_has_no_cross_contamination() {
        let (_, store) = store();
        store
            .increment(GLOBAL_SEQUENCE_KEY, 125_150)
            .await
            .unwrap();

        let first = store.next_id().await.unwrap();
        let second = store.next_id().await.unwrap();
        assert_eq!((first, second), (125_151, 125_152));

        for id in [first, second] {
            store.create_item(note().with_id(id)).await.unwrap();
            store
                .create_item(
                    NewItem::new(USER)
                        .with_id(id)
                        .with_edge(format!("profile-{id}"))
                        .owned_by(100_001, 100_002),
                )
                .await
                .unwrap();
        }

        for id in [first, second] {
            assert_eq!(
                store
                    .get_items_by_index(&IndexQuery::by_id(id))
                    .await
                    .unwrap()
                    .len(),
                2
            );

            let query = IndexQuery::by_id(id).of_type(NOTE);
            let rows = store.get_items_by_index(&query).await.unwrap();

            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].id, id);
            assert_eq!(rows[0].type_id, NOTE);
        }
    }

    #[tokio::test]
    async fn test_every_index_finds_a_new_item() {
        let (_, store) = store();
        let created = store
            .create_item(note().with_reference("2024-06-15"))
            .await
            .unwrap();

        let queries = [
            IndexQuery::by_edge(created.edge_id.clone()),
            IndexQuery::by_id(created.id),
            IndexQuery::by_type_owner_space(NOTE, 100_001, 100_002),
        ];
        for query in &queries {
            let rows = store.get_items_by_index(query).await.unwrap();
            assert_eq!(rows, vec![created.clone()], "{}", query.index);
        }

        let equals = IndexQuery::new(IndexName::Edge, created.edge_id.clone())
            .with_range(RangeCondition::Equals(created.type_reference()));
        assert_eq!(store.get_items_by_index(&equals).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_conditional_update_race_has_one_winner() {
        let (_, store) = store();
        let created = store
            .create_item(note().with_status("unclassified"))
            .await
            .unwrap();
        let precondition = Precondition::equals(ItemField::StatusId, "unclassified");

        let update_a = ItemUpdate::new().set_status("spam");
        let update_b = ItemUpdate::new().set_status("ham");
        let (a, b) = tokio::join!(
            store.update_item(
                created.id,
                &created.edge_id,
                &update_a,
                100_001,
                100_002,
                Some(&precondition),
            ),
            store.update_item(
                created.id,
                &created.edge_id,
                &update_b,
                100_003,
                100_002,
                Some(&precondition),
            ),
        );

        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(a ^ b);

        let stored = store
            .get_item(created.id, &created.edge_id)
            .await
            .unwrap()
            .unwrap();
        let expected = if a { "spam" } else { "ham" };
        assert_eq!(stored.status_id.as_deref(), Some(expected));
    }

    #[tokio::test]
    async fn test_update_refreshes_modified_stamp_only() {
        let (clock, store) = store();
        let created = store.create_item(note()).await.unwrap();

        clock.advance(30);
        assert!(store
            .update_item(
                created.id,
                &created.edge_id,
                &ItemUpdate::new().set_attribute("body", "edited"),
                100_009,
                100_002,
                None,
            )
            .await
            .unwrap());

        let stored = store
            .get_item(created.id, &created.edge_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.created_on_utc, 1_700_000_000);
        assert_eq!(stored.modified_on_utc, 1_700_000_030);
        assert_eq!(stored.modified_by, 100_009);
        assert_eq!(stored.created_by, 100_001);
    }

    #[tokio::test]
    async fn test_empty_reference_update_is_rejected_before_any_write() {
        let (clock, store) = store();
        let created = store.create_item(note()).await.unwrap();

        clock.advance(30);
        let result = store
            .update_item(
                created.id,
                &created.edge_id,
                &ItemUpdate::new().set_reference(""),
                100_009,
                100_002,
                None,
            )
            .await;

        assert!(matches!(
            result,
            Err(RepositoryError::SchemaViolation(ItemError::InvalidField {
                field: "ReferenceId",
                ..
            }))
        ));
        let stored = store
            .get_item(created.id, &created.edge_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, created);
    }

    #[tokio::test]
    async fn test_soft_delete_and_restore() {
        let (_, store) = store();
        let created = store.create_item(note()).await.unwrap();

        assert!(store
            .soft_delete_item(created.id, &created.edge_id, 100_001, 100_002)
            .await
            .unwrap());

        let listed = store
            .get_items_by_index(&IndexQuery::by_type_owner_space(NOTE, 100_001, 100_002))
            .await
            .unwrap();
        assert!(listed[0].is_deleted());
        assert_eq!(listed[0].deleted_by, Some(100_001));

        assert!(store
            .restore_item(created.id, &created.edge_id, 1, 2)
            .await
            .unwrap());
        let stored = store
            .get_item(created.id, &created.edge_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.is_deleted());
    }

    #[tokio::test]
    async fn test_transfer_ownership_validates_target() {
        let (_, store) = store();
        let created = store.create_item(note()).await.unwrap();

        assert!(matches!(
            store
                .transfer_ownership(created.id, &created.edge_id, 0, 100_078, 1, 2)
                .await,
            Err(RepositoryError::SchemaViolation(_))
        ));
        assert!(store
            .transfer_ownership(created.id, &created.edge_id, 100_077, 100_078, 1, 2)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_register_once_first_writer_wins() {
        let (_, store) = store();
        let claim = |status: &str| {
            NewItem::new(NOTE)
                .with_id(200_500)
                .with_edge("classification|invoice")
                .owned_by(100_001, 100_002)
                .with_status(status)
        };

        let (a, b) = tokio::join!(
            store.register_once(claim("by-a")),
            store.register_once(claim("by-b"))
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(a.is_created() ^ b.is_created());
        assert_eq!(a.item(), b.item());
    }

    #[tokio::test]
    async fn test_register_once_requires_explicit_id() {
        let (_, store) = store();
        assert_eq!(
            store.register_once(note()).await,
            Err(RepositoryError::SchemaViolation(ItemError::MissingField("Id")))
        );
    }

    #[tokio::test]
    async fn test_resolve_item_through_map() {
        let (clock, store) = store();
        let user = store
            .create_item(NewItem::new(USER).owned_by(100_001, 100_002))
            .await
            .unwrap();

        store
            .map_external_key(API_KEY, "sk_live_abc", &user.key(), Some(1_700_000_060))
            .await
            .unwrap();

        let resolved = store.resolve_item(API_KEY, "sk_live_abc").await.unwrap();
        assert_eq!(resolved, Some(user.clone()));
        assert_eq!(store.resolve_item(API_KEY, "sk_live_xyz").await.unwrap(), None);

        clock.advance(60);
        assert_eq!(store.resolve_map(API_KEY, "sk_live_abc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lock_mutual_exclusion_and_expiry() {
        let (clock, store) = store();

        let (a, b) = tokio::join!(
            store.acquire_lock("X", Some(5)),
            store.acquire_lock("X", Some(5))
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(a.is_some() ^ b.is_some());

        clock.advance(6);
        let third = store.acquire_lock("X", Some(5)).await.unwrap();
        assert!(third.is_some());
    }

    #[tokio::test]
    async fn test_lock_defaults_to_configured_duration() {
        let (_, store) = store();
        let lease = store.acquire_lock("X", None).await.unwrap().unwrap();
        assert_eq!(lease.lock_duration_seconds, 600);

        let guard = store.lock("Y", None).await.unwrap().unwrap();
        assert!(store.get_lock("Y").await.unwrap().is_some());
        guard.release().await.unwrap();
        assert!(store.get_lock("Y").await.unwrap().is_none());

        assert!(matches!(
            store.lock("Z", Some(1)).await,
            Err(RepositoryError::InvalidData(_))
        ));
        assert!(store.get_lock("Z").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_ids_are_unique() {
        let (_, store) = store();

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.next_id().await.unwrap() }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            let id = handle.await.unwrap();
            assert!(id > MIN_USER_DEFINED_OBJECT_ID);
            assert!(ids.insert(id));
        }
    }

    struct StalledItems;

    #[async_trait]
    impl ItemRepository for StalledItems {
        async fn get_item(&self, _id: i64, _edge_id: &str) -> Result<Option<Item>> {
            std::future::pending().await
        }

        async fn query_index(&self, _query: &IndexQuery) -> Result<Vec<Item>> {
            std::future::pending().await
        }

        async fn create_item(&self, _item: &Item) -> Result<()> {
            std::future::pending().await
        }

        async fn update_item(
            &self,
            _id: i64,
            _edge_id: &str,
            _update: &ItemUpdate,
            _stamp: &AuditStamp,
            _precondition: Option<&Precondition>,
        ) -> Result<bool> {
            std::future::pending().await
        }

        async fn soft_delete_item(
            &self,
            _id: i64,
            _edge_id: &str,
            _stamp: &AuditStamp,
        ) -> Result<bool> {
            std::future::pending().await
        }

        async fn restore_item(&self, _id: i64, _edge_id: &str, _stamp: &AuditStamp) -> Result<bool> {
            std::future::pending().await
        }

        async fn transfer_ownership(
            &self,
            _id: i64,
            _edge_id: &str,
            _owner_id: i64,
            _workspace_id: i64,
            _stamp: &AuditStamp,
        ) -> Result<bool> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_stalled_backend_times_out() {
        let config = StoreConfig {
            operation_timeout_ms: 20,
            ..StoreConfig::default()
        };
        let store = ItemStore::new(
            Arc::new(StalledItems),
            Arc::new(InMemoryMapRepository::new()),
            Arc::new(InMemorySequenceAllocator::new()),
            Arc::new(InProcessLockProvider::new()),
            types(),
            &config,
        );

        let result = store.get_item(1, "7|1").await;

        assert!(matches!(result, Err(RepositoryError::Timeout(_))));
        assert!(result.unwrap_err().is_retryable());
    }
}
