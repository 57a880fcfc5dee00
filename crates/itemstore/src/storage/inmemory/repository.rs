//! In-memory item repository.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use itemstore_core::item::{
    apply_restore, apply_soft_delete, apply_transfer, apply_update, AuditStamp, Item, ItemKey,
    ItemUpdate, Precondition,
};
use itemstore_core::storage::{IndexQuery, ItemRepository, RepositoryError, Result};

use super::projection::project;

/// In-memory item table.
///
/// Data is not persisted and is lost when the last clone is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryItemRepository {
    items: Arc<RwLock<BTreeMap<(i64, String), Item>>>,
}

impl InMemoryItemRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, soft-deleted ones included.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    /// Runs `mutate` on the row under the write guard.
    ///
    /// The precondition is checked first; `mutate` reports whether it
    /// changed anything.
    async fn mutate_row<F>(
        &self,
        id: i64,
        edge_id: &str,
        precondition: Option<&Precondition>,
        mutate: F,
    ) -> Result<bool>
    where
        F: FnOnce(&mut Item) -> bool + Send,
    {
        let mut items = self.items.write().await;
        let Some(item) = items.get_mut(&(id, edge_id.to_string())) else {
            return Err(RepositoryError::NotFound {
                entity_type: "Item",
                id: ItemKey::new(id, edge_id).to_string(),
            });
        };

        if precondition.is_some_and(|condition| !condition.holds_for(item)) {
            return Ok(false);
        }
        Ok(mutate(item))
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn get_item(&self, id: i64, edge_id: &str) -> Result<Option<Item>> {
        let items = self.items.read().await;
        Ok(items.get(&(id, edge_id.to_string())).cloned())
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<Vec<Item>> {
        if !query.hash_key.fits(query.index) {
            return Err(RepositoryError::InvalidData(format!(
                "hash key {} does not fit {}",
                query.hash_key, query.index
            )));
        }
        let items = self.items.read().await;
        Ok(project(items.values(), query))
    }

    async fn create_item(&self, item: &Item) -> Result<()> {
        let mut items = self.items.write().await;
        let key = (item.id, item.edge_id.clone());
        if items.contains_key(&key) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "Item",
                id: item.key().to_string(),
            });
        }
        items.insert(key, item.clone());
        Ok(())
    }

    async fn update_item(
        &self,
        id: i64,
        edge_id: &str,
        update: &ItemUpdate,
        stamp: &AuditStamp,
        precondition: Option<&Precondition>,
    ) -> Result<bool> {
        self.mutate_row(id, edge_id, precondition, |item| {
            apply_update(item, update, stamp);
            true
        })
        .await
    }

    async fn soft_delete_item(&self, id: i64, edge_id: &str, stamp: &AuditStamp) -> Result<bool> {
        self.mutate_row(id, edge_id, None, |item| apply_soft_delete(item, stamp))
            .await
    }

    async fn restore_item(&self, id: i64, edge_id: &str, stamp: &AuditStamp) -> Result<bool> {
        self.mutate_row(id, edge_id, None, |item| apply_restore(item, stamp))
            .await
    }

    async fn transfer_ownership(
        &self,
        id: i64,
        edge_id: &str,
        owner_id: i64,
        workspace_id: i64,
        stamp: &AuditStamp,
    ) -> Result<bool> {
        let not_deleted = Precondition::not_deleted();
        self.mutate_row(id, edge_id, Some(&not_deleted), |item| {
            apply_transfer(item, owner_id, workspace_id, stamp);
            true
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use itemstore_core::item::{build_item, ItemField, ItemTypeId, NewItem};

    use super::*;

    fn sample(id: i64) -> Item {
        let new = NewItem::new(ItemTypeId(7))
            .owned_by(100_001, 100_002)
            .with_status("pending");
        build_item(new, id, 1_000).unwrap()
    }

    fn stamp(on: i64) -> AuditStamp {
        AuditStamp::new(100_001, 100_002, on)
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let repo = InMemoryItemRepository::new();
        let item = sample(125_151);

        repo.create_item(&item).await.unwrap();

        let fetched = repo.get_item(125_151, "7|125151").await.unwrap();
        assert_eq!(fetched, Some(item));
        assert_eq!(repo.get_item(125_151, "7|other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_key_is_rejected_not_overwritten() {
        let repo = InMemoryItemRepository::new();
        repo.create_item(&sample(125_151)).await.unwrap();

        let mut clash = sample(125_151);
        clash.status_id = Some("other".to_string());
        let result = repo.create_item(&clash).await;

        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
        let stored = repo.get_item(125_151, "7|125151").await.unwrap().unwrap();
        assert_eq!(stored.status_id.as_deref(), Some("pending"));
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let repo = InMemoryItemRepository::new();
        let result = repo
            .update_item(1, "7|1", &ItemUpdate::new(), &stamp(2), None)
            .await;

        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_precondition_failure_leaves_row_untouched() {
        let repo = InMemoryItemRepository::new();
        repo.create_item(&sample(125_151)).await.unwrap();

        let applied = repo
            .update_item(
                125_151,
                "7|125151",
                &ItemUpdate::new().set_status("approved"),
                &stamp(2_000),
                Some(&Precondition::equals(ItemField::StatusId, "rejected")),
            )
            .await
            .unwrap();

        assert!(!applied);
        let stored = repo.get_item(125_151, "7|125151").await.unwrap().unwrap();
        assert_eq!(stored.status_id.as_deref(), Some("pending"));
        assert_eq!(stored.modified_on_utc, 1_000);
    }

    #[tokio::test]
    async fn test_concurrent_conditional_updates_have_one_winner() {
        let repo = InMemoryItemRepository::new();
        repo.create_item(&sample(125_151)).await.unwrap();

        let mut handles = Vec::new();
        for worker in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.update_item(
                    125_151,
                    "7|125151",
                    &ItemUpdate::new()
                        .set_status("claimed")
                        .set_attribute("claimedBy", worker),
                    &stamp(2_000 + worker),
                    Some(&Precondition::equals(ItemField::StatusId, "pending")),
                )
                .await
                .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_soft_delete_visible_through_every_index() {
        let repo = InMemoryItemRepository::new();
        let item = sample(125_151);
        repo.create_item(&item).await.unwrap();

        assert!(repo
            .soft_delete_item(125_151, "7|125151", &stamp(2_000))
            .await
            .unwrap());
        assert!(!repo
            .soft_delete_item(125_151, "7|125151", &stamp(3_000))
            .await
            .unwrap());

        let queries = [
            IndexQuery::by_edge("7|125151"),
            IndexQuery::by_id(125_151),
            IndexQuery::by_type_owner_space(ItemTypeId(7), 100_001, 100_002),
        ];
        for query in &queries {
            let rows = repo.query_index(query).await.unwrap();
            assert_eq!(rows.len(), 1, "{}", query.index);
            assert!(rows[0].is_deleted());
            assert_eq!(rows[0].deleted_on_utc, Some(2_000));
            assert!(repo
                .query_index(&query.clone().exclude_deleted())
                .await
                .unwrap()
                .is_empty());
        }
    }

    #[tokio::test]
    async fn test_update_never_clears_soft_delete() {
        let repo = InMemoryItemRepository::new();
        repo.create_item(&sample(125_151)).await.unwrap();
        repo.soft_delete_item(125_151, "7|125151", &stamp(2_000))
            .await
            .unwrap();

        repo.update_item(
            125_151,
            "7|125151",
            &ItemUpdate::new().clear_status().set_attribute("x", 1),
            &stamp(3_000),
            None,
        )
        .await
        .unwrap();

        let stored = repo.get_item(125_151, "7|125151").await.unwrap().unwrap();
        assert!(stored.is_deleted());

        assert!(repo
            .restore_item(125_151, "7|125151", &stamp(4_000))
            .await
            .unwrap());
        let stored = repo.get_item(125_151, "7|125151").await.unwrap().unwrap();
        assert!(!stored.is_deleted());
    }

    #[tokio::test]
    async fn test_transfer_moves_item_between_owner_partitions() {
        let repo = InMemoryItemRepository::new();
        repo.create_item(&sample(125_151)).await.unwrap();

        assert!(repo
            .transfer_ownership(125_151, "7|125151", 100_077, 100_078, &stamp(2_000))
            .await
            .unwrap());

        let old_owner = IndexQuery::by_type_owner_space(ItemTypeId(7), 100_001, 100_002);
        let new_owner = IndexQuery::by_type_owner_space(ItemTypeId(7), 100_077, 100_078);
        assert!(repo.query_index(&old_owner).await.unwrap().is_empty());
        assert_eq!(repo.query_index(&new_owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transfer_of_deleted_item_is_rejected() {
        let repo = InMemoryItemRepository::new();
        repo.create_item(&sample(125_151)).await.unwrap();
        repo.soft_delete_item(125_151, "7|125151", &stamp(2_000))
            .await
            .unwrap();

        assert!(!repo
            .transfer_ownership(125_151, "7|125151", 100_077, 100_078, &stamp(3_000))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_id_index_rejects_text_hash_key() {
        let repo = InMemoryItemRepository::new();
        let query = IndexQuery::new(
            itemstore_core::storage::IndexName::IdTypeReference,
            "125151",
        );

        assert!(matches!(
            repo.query_index(&query).await,
            Err(RepositoryError::InvalidData(_))
        ));
    }
}
