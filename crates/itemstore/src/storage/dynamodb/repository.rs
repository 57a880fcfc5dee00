//! DynamoDB item repository.
//!
//! Index projections are maintained by DynamoDB itself from the key
//! attributes written on every row; queries against them are eventually
//! consistent while point reads of the base table are strongly consistent.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::ReturnValuesOnConditionCheckFailure;
use aws_sdk_dynamodb::Client;

use itemstore_core::item::{AuditStamp, Item, ItemKey, ItemUpdate, Precondition};
use itemstore_core::storage::{IndexQuery, ItemRepository, RepositoryError, Result};

use super::conversions::{attributes_to_item, item_key, item_to_attributes};
use super::error::{map_get_item_error, map_guarded_update_error, map_put_item_error, map_query_error};
use super::expressions::{self, ExpressionAttributes};

const ENTITY: &str = "Item";

/// DynamoDB-based item repository over the items table.
#[derive(Clone)]
pub struct DynamoDbItemRepository {
    client: Client,
    table_name: String,
}

impl DynamoDbItemRepository {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Issues an update that only applies when `condition` holds.
    ///
    /// The old row is requested on a failed check so a rejected guard can be
    /// told apart from a missing row.
    async fn guarded_update(
        &self,
        id: i64,
        edge_id: &str,
        update_expression: String,
        condition: String,
        attrs: ExpressionAttributes,
    ) -> Result<bool> {
        let (names, values) = attrs.into_parts();
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(item_key(id, edge_id)))
            .update_expression(update_expression)
            .condition_expression(condition)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .return_values_on_condition_check_failure(ReturnValuesOnConditionCheckFailure::AllOld)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                map_guarded_update_error(err, ENTITY, ItemKey::new(id, edge_id).to_string())
            }
        }
    }
}

#[async_trait]
impl ItemRepository for DynamoDbItemRepository {
    async fn get_item(&self, id: i64, edge_id: &str) -> Result<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(item_key(id, edge_id)))
            .consistent_read(true)
            .send()
            .await
            .map_err(map_get_item_error)?;

        match result.item {
            Some(row) => Ok(Some(attributes_to_item(&row)?)),
            None => Ok(None),
        }
    }

    async fn query_index(&self, query: &IndexQuery) -> Result<Vec<Item>> {
        if !query.hash_key.fits(query.index) {
            return Err(RepositoryError::InvalidData(format!(
                "{} is not a valid hash key for {}",
                query.hash_key, query.index
            )));
        }
        if query.limit == Some(0) {
            return Ok(Vec::new());
        }

        let mut attrs = ExpressionAttributes::new();
        let key_condition = expressions::key_condition(&mut attrs, query);
        let filter = query
            .exclude_deleted
            .then(|| expressions::condition(&mut attrs, &Precondition::not_deleted()));
        let (names, values) = attrs.into_parts();

        let mut items = Vec::new();
        let mut start_key = None;
        loop {
            let mut request = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(query.index.as_str())
                .key_condition_expression(&key_condition)
                .set_filter_expression(filter.clone())
                .set_expression_attribute_names(names.clone())
                .set_expression_attribute_values(values.clone())
                .scan_index_forward(!query.descending)
                .set_exclusive_start_key(start_key.take());

            // DynamoDB applies Limit before the filter, so only push it down
            // when nothing is filtered out.
            if let (Some(limit), None) = (query.limit, &filter) {
                let remaining = limit.saturating_sub(items.len());
                request = request.limit(i32::try_from(remaining).unwrap_or(i32::MAX));
            }

            let output = request.send().await.map_err(map_query_error)?;
            for row in output.items() {
                items.push(attributes_to_item(row)?);
            }

            if let Some(limit) = query.limit {
                if items.len() >= limit {
                    items.truncate(limit);
                    break;
                }
            }
            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        tracing::trace!(index = %query.index, hash_key = %query.hash_key, count = items.len(), "Index query");
        Ok(items)
    }

    async fn create_item(&self, item: &Item) -> Result<()> {
        let mut attrs = ExpressionAttributes::new();
        let condition = expressions::row_absent(&mut attrs);
        let (names, _) = attrs.into_parts();

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_to_attributes(item)))
            .condition_expression(condition)
            .set_expression_attribute_names(names)
            .send()
            .await
            .map_err(|e| map_put_item_error(e, ENTITY, item.key().to_string()))?;

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
        let mut attrs = ExpressionAttributes::new();
        let update_expression = expressions::item_update(&mut attrs, edge_id, update, stamp)?;
        let condition = expressions::guarded(&mut attrs, precondition);

        self.guarded_update(id, edge_id, update_expression, condition, attrs)
            .await
    }

    async fn soft_delete_item(&self, id: i64, edge_id: &str, stamp: &AuditStamp) -> Result<bool> {
        let mut attrs = ExpressionAttributes::new();
        let update_expression = expressions::soft_delete(&mut attrs, stamp);
        let condition = expressions::guarded(&mut attrs, Some(&Precondition::not_deleted()));

        self.guarded_update(id, edge_id, update_expression, condition, attrs)
            .await
    }

    async fn restore_item(&self, id: i64, edge_id: &str, stamp: &AuditStamp) -> Result<bool> {
        let mut attrs = ExpressionAttributes::new();
        let update_expression = expressions::restore(&mut attrs, stamp);
        let condition = format!(
            "{} AND ({})",
            expressions::row_exists(&mut attrs),
            expressions::deleted(&mut attrs)
        );

        self.guarded_update(id, edge_id, update_expression, condition, attrs)
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
        let mut attrs = ExpressionAttributes::new();
        let update_expression =
            expressions::transfer(&mut attrs, edge_id, owner_id, workspace_id, stamp)?;
        let condition = expressions::guarded(&mut attrs, Some(&Precondition::not_deleted()));

        self.guarded_update(id, edge_id, update_expression, condition, attrs)
            .await
    }
}
