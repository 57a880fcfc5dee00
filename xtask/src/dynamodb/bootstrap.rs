//! First-run data setup (Imperative Shell).

use aws_sdk_dynamodb::Client;
use itemstore::storage::dynamodb::DynamoDbSequenceAllocator;
use itemstore_core::schema::TableRegistry;
use itemstore_core::sequence::bootstrap_global_sequence;

use super::error::Result;

/// Moves the global sequence past the reserved id range. Idempotent.
///
/// Returns the counter value afterwards.
pub async fn bootstrap_sequences(client: &Client, tables: &TableRegistry) -> Result<i64> {
    let allocator = DynamoDbSequenceAllocator::new(client.clone(), tables.sequences_table());
    let value = bootstrap_global_sequence(&allocator).await?;

    tracing::info!(table = %tables.sequences_table(), value, "Global sequence bootstrapped");
    Ok(value)
}
