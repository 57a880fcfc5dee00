use async_trait::async_trait;

use crate::auxmap::AuxMapEntry;
use crate::item::{AuditStamp, Item, ItemUpdate, Precondition};

use super::{IndexQuery, Result};

/// Repository for the polymorphic item table and its index projections.
///
/// Mutations return `Ok(false)` when their precondition no longer holds, and
/// `RepositoryError::NotFound` when the row does not exist at all.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Gets an item by its primary key.
    async fn get_item(&self, id: i64, edge_id: &str) -> Result<Option<Item>>;

    /// Runs a query against one of the index projections.
    async fn query_index(&self, query: &IndexQuery) -> Result<Vec<Item>>;

    /// Persists a new item. Fails with `AlreadyExists` instead of overwriting.
    async fn create_item(&self, item: &Item) -> Result<()>;

    /// Applies `update` if `precondition` holds on the current row.
    async fn update_item(
        &self,
        id: i64,
        edge_id: &str,
        update: &ItemUpdate,
        stamp: &AuditStamp,
        precondition: Option<&Precondition>,
    ) -> Result<bool>;

    /// Sets the soft-delete marker. Returns false if it was already set.
    async fn soft_delete_item(&self, id: i64, edge_id: &str, stamp: &AuditStamp) -> Result<bool>;

    /// Clears the soft-delete marker. Returns false if it was not set.
    async fn restore_item(&self, id: i64, edge_id: &str, stamp: &AuditStamp) -> Result<bool>;

    /// Reassigns owner and workspace. Returns false for deleted items.
    async fn transfer_ownership(
        &self,
        id: i64,
        edge_id: &str,
        owner_id: i64,
        workspace_id: i64,
        stamp: &AuditStamp,
    ) -> Result<bool>;
}

/// Repository for the auxiliary mapping table.
#[async_trait]
pub trait MapRepository: Send + Sync {
    /// Writes an entry, replacing any entry with the same key.
    async fn put_map(&self, entry: &AuxMapEntry) -> Result<()>;

    /// Gets an entry by key. Expired entries are reported as missing.
    async fn try_get_map(&self, id: i64, edge_id: &str) -> Result<Option<AuxMapEntry>>;

    /// Removes an entry. Removing a missing entry is not an error.
    async fn delete_map(&self, id: i64, edge_id: &str) -> Result<()>;
}
