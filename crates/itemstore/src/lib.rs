//! Imperative shell for the itemstore entity storage layer.
//!
//! Storage backends for the repository, allocator and lock traits defined in
//! `itemstore_core`, the read-through map cache, and [`ItemStore`], the
//! service the application talks to.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): process-local backends
//! - `dynamodb`: AWS DynamoDB backends using `aws-sdk-dynamodb`
//!
//! Both may be enabled at once; the DynamoDB deploy tooling does so.

pub mod cache;
pub mod config;
pub mod lock;
pub mod storage;
pub mod store;

pub use config::StoreConfig;
pub use store::{ItemStore, Registration};
