use async_trait::async_trait;
use aws_sdk_dynamodb::types::ReturnValue;
use aws_sdk_dynamodb::Client;

use itemstore_core::sequence::SequenceAllocator;
use itemstore_core::storage::{RepositoryError, Result};

use super::attributes::VALUE;
use super::conversions::{get_number, named_key, number};
use super::error::map_update_item_error;
use super::expressions::ExpressionAttributes;

const ENTITY: &str = "Sequence";

/// Sequence counters over the sequences table, advanced with atomic `ADD`.
#[derive(Clone)]
pub struct DynamoDbSequenceAllocator {
    client: Client,
    table_name: String,
}

impl DynamoDbSequenceAllocator {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl SequenceAllocator for DynamoDbSequenceAllocator {
    async fn increment(&self, key: &str, amount: i64) -> Result<i64> {
        let mut attrs = ExpressionAttributes::new();
        let update_expression = format!("ADD {} {}", attrs.name(VALUE), attrs.value(number(amount)));
        let (names, values) = attrs.into_parts();

        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(named_key(key)))
            .update_expression(update_expression)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values)
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(|e| map_update_item_error(e, ENTITY, key))?;

        let attributes = output.attributes.ok_or_else(|| {
            RepositoryError::InvalidData(format!("Sequence {} returned no value", key))
        })?;
        let value = get_number::<i64>(&attributes, VALUE)?;

        tracing::trace!(key, amount, value, "Sequence incremented");
        Ok(value)
    }
}
