//! DynamoDB storage backend implementation.
//!
//! Implements the repository, sequence and lock traits from
//! `itemstore_core` over four tables using `aws-sdk-dynamodb`. Table and
//! index layout comes from [`itemstore_core::schema::TableRegistry`].

mod attributes;
mod client;
mod conversions;
mod error;
mod expressions;
mod lock;
mod maps;
mod repository;
mod sequence;

pub use client::create_client;
pub use lock::DynamoDbLockProvider;
pub use maps::DynamoDbMapRepository;
pub use repository::DynamoDbItemRepository;
pub use sequence::DynamoDbSequenceAllocator;
