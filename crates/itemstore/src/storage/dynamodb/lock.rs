use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;

use itemstore_core::lock::{LockLease, LockProvider};
use itemstore_core::storage::{RepositoryError, Result};
use itemstore_core::time::Clock;

use super::attributes::{EXPIRES_AT, KEY, LAST_HEARTBEAT_ON, OWNER_TOKEN};
use super::conversions::{attributes_to_lease, lease_to_attributes, named_key, number, string};
use super::error::{
    is_condition_failure, map_delete_item_error, map_get_item_error, map_put_item_error,
    map_update_item_error,
};
use super::expressions::ExpressionAttributes;

const ENTITY: &str = "LockLease";

/// Distributed leases over the locks table.
///
/// Acquisition is a conditional put that succeeds only when no row exists
/// or the stored lease has expired; heartbeat and release are fenced by the
/// owner token.
#[derive(Clone)]
pub struct DynamoDbLockProvider {
    client: Client,
    table_name: String,
    clock: Arc<dyn Clock>,
}

impl DynamoDbLockProvider {
    pub fn new(client: Client, table_name: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            clock,
        }
    }
}

#[async_trait]
impl LockProvider for DynamoDbLockProvider {
    async fn acquire(&self, key: &str, duration_seconds: i64) -> Result<Option<LockLease>> {
        if duration_seconds <= 0 {
            return Err(RepositoryError::InvalidData(format!(
                "Lock duration must be positive, got {}",
                duration_seconds
            )));
        }

        let now = self.clock.now_unix();
        let lease = LockLease::new(key, duration_seconds, now);

        let mut attrs = ExpressionAttributes::new();
        let condition = format!(
            "attribute_not_exists({}) OR {} <= {}",
            attrs.name(KEY),
            attrs.name(EXPIRES_AT),
            attrs.value(number(now))
        );
        let (names, values) = attrs.into_parts();

        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(lease_to_attributes(&lease)))
            .condition_expression(condition)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .send()
            .await;

        match result {
            Ok(_) => {
                tracing::debug!(key, owner = %lease.owner_token, duration_seconds, "Lock acquired");
                Ok(Some(lease))
            }
            Err(err) if is_condition_failure(&err) => {
                tracing::trace!(key, "Lock busy");
                Ok(None)
            }
            Err(err) => Err(map_put_item_error(err, ENTITY, key)),
        }
    }

    async fn heartbeat(&self, lease: &mut LockLease) -> Result<bool> {
        let now = self.clock.now_unix();
        let renewed = lease.renewed(now);

        let mut attrs = ExpressionAttributes::new();
        let heartbeat = attrs.name(LAST_HEARTBEAT_ON);
        let expires = attrs.name(EXPIRES_AT);
        let token = attrs.name(OWNER_TOKEN);
        let now_value = attrs.value(number(now));
        let expires_value = attrs.value(number(renewed.expires_at()));
        let token_value = attrs.value(string(lease.owner_token.as_str()));

        let update_expression = format!("SET {heartbeat} = {now_value}, {expires} = {expires_value}");
        let condition = format!("{token} = {token_value} AND {expires} > {now_value}");
        let (names, values) = attrs.into_parts();

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(named_key(&lease.key)))
            .update_expression(update_expression)
            .condition_expression(condition)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .send()
            .await;

        match result {
            Ok(_) => {
                *lease = renewed;
                Ok(true)
            }
            Err(err) if is_condition_failure(&err) => {
                tracing::debug!(key = %lease.key, "Heartbeat rejected, lease no longer held");
                Ok(false)
            }
            Err(err) => Err(map_update_item_error(err, ENTITY, lease.key.as_str())),
        }
    }

    async fn release(&self, lease: &LockLease) -> Result<()> {
        let mut attrs = ExpressionAttributes::new();
        let condition = format!(
            "{} = {}",
            attrs.name(OWNER_TOKEN),
            attrs.value(string(lease.owner_token.as_str()))
        );
        let (names, values) = attrs.into_parts();

        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(named_key(&lease.key)))
            .condition_expression(condition)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .send()
            .await;

        match result {
            Ok(_) => {
                tracing::debug!(key = %lease.key, "Lock released");
                Ok(())
            }
            // Someone else holds it now, or nobody does
            Err(err) if is_condition_failure(&err) => Ok(()),
            Err(err) => Err(map_delete_item_error(err, ENTITY, lease.key.as_str())),
        }
    }

    async fn get_lock(&self, key: &str) -> Result<Option<LockLease>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(named_key(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(map_get_item_error)?;

        let lease = match result.item {
            Some(row) => attributes_to_lease(&row)?,
            None => return Ok(None),
        };
        Ok(lease.is_valid(self.clock.now_unix()).then_some(lease))
    }
}
