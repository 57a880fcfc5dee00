//! AWS SDK table inspection (Imperative Shell).

use aws_sdk_dynamodb::types::{IndexStatus, TimeToLiveStatus};
use aws_sdk_dynamodb::Client;
use itemstore::StoreConfig;

use super::error::{sdk_error, Result};
use super::planning::{GsiState, GsiStatus, TableState, TableStatus};

/// Returns a display string for the target environment.
pub fn target_display(config: &StoreConfig) -> String {
    match &config.endpoint_url {
        Some(url) => format!("Local DynamoDB ({})", url),
        None => format!("AWS DynamoDB (region: {})", config.region),
    }
}

/// Fetches current table state, returns None if table doesn't exist.
pub async fn get_table_state(client: &Client, table_name: &str) -> Result<Option<TableState>> {
    let response = match client.describe_table().table_name(table_name).send().await {
        Ok(response) => response,
        Err(err)
            if err
                .as_service_error()
                .is_some_and(|e| e.is_resource_not_found_exception()) =>
        {
            return Ok(None);
        }
        Err(err) => return Err(sdk_error(err)),
    };

    let Some(table) = response.table() else {
        return Ok(None);
    };

    let gsis = table
        .global_secondary_indexes()
        .iter()
        .map(|gsi| GsiState {
            name: gsi.index_name().unwrap_or_default().to_string(),
            status: match gsi.index_status() {
                Some(IndexStatus::Creating) => GsiStatus::Creating,
                Some(IndexStatus::Updating) => GsiStatus::Updating,
                Some(IndexStatus::Deleting) => GsiStatus::Deleting,
                _ => GsiStatus::Active,
            },
        })
        .collect();

    let status = match table.table_status() {
        Some(aws_sdk_dynamodb::types::TableStatus::Creating) => TableStatus::Creating,
        Some(aws_sdk_dynamodb::types::TableStatus::Updating) => TableStatus::Updating,
        Some(aws_sdk_dynamodb::types::TableStatus::Deleting) => TableStatus::Deleting,
        _ => TableStatus::Active,
    };

    let ttl_attribute = get_ttl_attribute(client, table_name).await?;

    Ok(Some(TableState {
        status,
        gsis,
        ttl_attribute,
    }))
}

/// Attribute with native TTL enabled or being enabled.
async fn get_ttl_attribute(client: &Client, table_name: &str) -> Result<Option<String>> {
    let response = client
        .describe_time_to_live()
        .table_name(table_name)
        .send()
        .await
        .map_err(sdk_error)?;

    Ok(response.time_to_live_description().and_then(|ttl| {
        match ttl.time_to_live_status() {
            Some(TimeToLiveStatus::Enabled | TimeToLiveStatus::Enabling) => {
                ttl.attribute_name().map(str::to_string)
            }
            _ => None,
        }
    }))
}
