use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;

use itemstore_core::auxmap::AuxMapEntry;
use itemstore_core::item::ItemKey;
use itemstore_core::storage::{MapRepository, Result};
use itemstore_core::time::Clock;

use super::conversions::{attributes_to_entry, entry_to_attributes, item_key};
use super::error::{map_delete_item_error, map_get_item_error, map_put_item_error};

const ENTITY: &str = "AuxMapEntry";

/// DynamoDB-based auxiliary map repository.
///
/// Native TTL deletes expired rows eventually; until it does, reads filter
/// them against the clock.
#[derive(Clone)]
pub struct DynamoDbMapRepository {
    client: Client,
    table_name: String,
    clock: Arc<dyn Clock>,
}

impl DynamoDbMapRepository {
    pub fn new(client: Client, table_name: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            clock,
        }
    }
}

#[async_trait]
impl MapRepository for DynamoDbMapRepository {
    async fn put_map(&self, entry: &AuxMapEntry) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(entry_to_attributes(entry)))
            .send()
            .await
            .map_err(|e| map_put_item_error(e, ENTITY, entry.key().to_string()))?;

        tracing::debug!(map = %entry.key(), target = %entry.target(), "Map entry stored");
        Ok(())
    }

    async fn try_get_map(&self, id: i64, edge_id: &str) -> Result<Option<AuxMapEntry>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(item_key(id, edge_id)))
            .consistent_read(true)
            .send()
            .await
            .map_err(map_get_item_error)?;

        let entry = match result.item {
            Some(row) => attributes_to_entry(&row)?,
            None => return Ok(None),
        };

        if entry.is_expired(self.clock.now_unix()) {
            tracing::trace!(map = %ItemKey::new(id, edge_id), "Map entry expired");
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn delete_map(&self, id: i64, edge_id: &str) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(item_key(id, edge_id)))
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, ENTITY, ItemKey::new(id, edge_id).to_string()))?;

        Ok(())
    }
}
