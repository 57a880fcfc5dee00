//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `RepositoryError` from `itemstore_core::storage`.
//! Transport failures and throttling become retryable `Unavailable` or
//! `Timeout`; they never read as NotFound.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use itemstore_core::storage::{RepositoryError, Result};

/// True when the request was rejected by its condition expression.
pub fn is_condition_failure<E: ProvideErrorMetadata, R>(err: &SdkError<E, R>) -> bool {
    err.as_service_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == "ConditionalCheckFailedException")
}

/// Map failures that happen before DynamoDB produced a service error.
fn map_transport_error<E, R>(err: &SdkError<E, R>, operation: &str) -> Option<RepositoryError> {
    match err {
        SdkError::TimeoutError(_) => Some(RepositoryError::Timeout(format!(
            "{} timed out",
            operation
        ))),
        SdkError::DispatchFailure(_) => Some(RepositoryError::Unavailable(format!(
            "{} could not be dispatched",
            operation
        ))),
        SdkError::ResponseError(_) => Some(RepositoryError::Unavailable(format!(
            "{} returned an unreadable response",
            operation
        ))),
        _ => None,
    }
}

fn throttled(reason: &str) -> RepositoryError {
    RepositoryError::Unavailable(format!("{}, please retry", reason))
}

/// Map a GetItem SDK error to RepositoryError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> RepositoryError {
    if let Some(mapped) = map_transport_error(&err, "GetItem") {
        return mapped;
    }
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table not found".to_string())
        }
        GetItemError::ProvisionedThroughputExceededException(_) => {
            throttled("Throughput exceeded")
        }
        GetItemError::RequestLimitExceeded(_) => throttled("Request limit exceeded"),
        GetItemError::InternalServerError(_) => {
            RepositoryError::Unavailable("DynamoDB internal server error".to_string())
        }
        err => RepositoryError::QueryFailed(format!("GetItem failed: {:?}", err)),
    }
}

/// Map a Query SDK error to RepositoryError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
) -> RepositoryError {
    if let Some(mapped) = map_transport_error(&err, "Query") {
        return mapped;
    }
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table or index not found".to_string())
        }
        QueryError::ProvisionedThroughputExceededException(_) => throttled("Throughput exceeded"),
        QueryError::RequestLimitExceeded(_) => throttled("Request limit exceeded"),
        QueryError::InternalServerError(_) => {
            RepositoryError::Unavailable("DynamoDB internal server error".to_string())
        }
        err => RepositoryError::QueryFailed(format!("Query failed: {:?}", err)),
    }
}

/// Map a PutItem SDK error to RepositoryError.
///
/// A failed condition is reported as `AlreadyExists`.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    entity_type: &'static str,
    id: impl Into<String>,
) -> RepositoryError {
    if let Some(mapped) = map_transport_error(&err, "PutItem") {
        return mapped;
    }
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => RepositoryError::AlreadyExists {
            entity_type,
            id: id.into(),
        },
        PutItemError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table not found".to_string())
        }
        PutItemError::ProvisionedThroughputExceededException(_) => {
            throttled("Throughput exceeded")
        }
        PutItemError::RequestLimitExceeded(_) => throttled("Request limit exceeded"),
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            RepositoryError::QueryFailed("Item collection size limit exceeded".to_string())
        }
        PutItemError::TransactionConflictException(_) => throttled("Transaction conflict"),
        PutItemError::InternalServerError(_) => {
            RepositoryError::Unavailable("DynamoDB internal server error".to_string())
        }
        err => RepositoryError::QueryFailed(format!("PutItem failed: {:?}", err)),
    }
}

/// Map an UpdateItem SDK error to RepositoryError.
///
/// A failed condition is reported as `NotFound`; guarded updates that need
/// to tell a missing row from a rejected guard use
/// [`map_guarded_update_error`].
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
    entity_type: &'static str,
    id: impl Into<String>,
) -> RepositoryError {
    if let Some(mapped) = map_transport_error(&err, "UpdateItem") {
        return mapped;
    }
    match err.into_service_error() {
        UpdateItemError::ConditionalCheckFailedException(_) => RepositoryError::NotFound {
            entity_type,
            id: id.into(),
        },
        UpdateItemError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table not found".to_string())
        }
        UpdateItemError::ProvisionedThroughputExceededException(_) => {
            throttled("Throughput exceeded")
        }
        UpdateItemError::RequestLimitExceeded(_) => throttled("Request limit exceeded"),
        UpdateItemError::ItemCollectionSizeLimitExceededException(_) => {
            RepositoryError::QueryFailed("Item collection size limit exceeded".to_string())
        }
        UpdateItemError::TransactionConflictException(_) => throttled("Transaction conflict"),
        UpdateItemError::InternalServerError(_) => {
            RepositoryError::Unavailable("DynamoDB internal server error".to_string())
        }
        err => RepositoryError::QueryFailed(format!("UpdateItem failed: {:?}", err)),
    }
}

/// Map the outcome of a guarded UpdateItem issued with
/// `ReturnValuesOnConditionCheckFailure::AllOld`.
///
/// When the condition fails and DynamoDB returns the old row, the row exists
/// and the guard rejected the write: `Ok(false)`. Without an old row the key
/// was missing: `NotFound`.
pub fn map_guarded_update_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
    entity_type: &'static str,
    id: impl Into<String>,
) -> Result<bool> {
    if let Some(UpdateItemError::ConditionalCheckFailedException(rejected)) =
        err.as_service_error()
    {
        return match rejected.item() {
            Some(_) => Ok(false),
            None => Err(RepositoryError::NotFound {
                entity_type,
                id: id.into(),
            }),
        };
    }
    Err(map_update_item_error(err, entity_type, id))
}

/// Map a DeleteItem SDK error to RepositoryError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
    entity_type: &'static str,
    id: impl Into<String>,
) -> RepositoryError {
    if let Some(mapped) = map_transport_error(&err, "DeleteItem") {
        return mapped;
    }
    match err.into_service_error() {
        DeleteItemError::ConditionalCheckFailedException(_) => RepositoryError::NotFound {
            entity_type,
            id: id.into(),
        },
        DeleteItemError::ResourceNotFoundException(_) => {
            RepositoryError::QueryFailed("Table not found".to_string())
        }
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            throttled("Throughput exceeded")
        }
        DeleteItemError::RequestLimitExceeded(_) => throttled("Request limit exceeded"),
        DeleteItemError::ItemCollectionSizeLimitExceededException(_) => {
            RepositoryError::QueryFailed("Item collection size limit exceeded".to_string())
        }
        DeleteItemError::TransactionConflictException(_) => throttled("Transaction conflict"),
        DeleteItemError::InternalServerError(_) => {
            RepositoryError::Unavailable("DynamoDB internal server error".to_string())
        }
        err => RepositoryError::QueryFailed(format!("DeleteItem failed: {:?}", err)),
    }
}
