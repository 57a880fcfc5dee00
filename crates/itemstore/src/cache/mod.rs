//! Cache backend implementations of `itemstore_core::cache::Cache`.

mod memory;

pub use memory::MemoryCache;
