use aws_sdk_dynamodb::Client;

use crate::config::StoreConfig;

/// Creates a DynamoDB client for the region and endpoint in `config`.
///
/// Credentials come from the default AWS provider chain.
pub async fn create_client(config: &StoreConfig) -> Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }

    let sdk_config = loader.load().await;
    tracing::debug!(
        region = %config.region,
        endpoint = config.endpoint_url.as_deref().unwrap_or("default"),
        "DynamoDB client created"
    );
    Client::new(&sdk_config)
}
