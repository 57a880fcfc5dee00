//! Storage backend implementations.
//!
//! Concrete implementations of the repository and allocator traits defined
//! in `itemstore_core`, selected at compile time via feature flags, plus the
//! cache-aside decorators that wrap any of them.

#[cfg(not(any(feature = "inmemory", feature = "dynamodb")))]
compile_error!(
    "No storage backend selected. Enable 'inmemory' or 'dynamodb' feature. \
    Example: cargo build -p itemstore --features dynamodb"
);

pub mod cached;

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;
