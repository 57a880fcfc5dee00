//! In-memory storage backend.
//!
//! Stores rows in maps wrapped in `Arc<RwLock<_>>`. Every conditional write
//! is evaluated and applied under a single write guard, which gives the same
//! per-row linearizability the distributed backend gets from the store.
//! Index projections are computed from the canonical rows on read, so they
//! are always consistent with the last completed write.

mod maps;
mod projection;
mod repository;
mod sequence;

pub use maps::InMemoryMapRepository;
pub use repository::InMemoryItemRepository;
pub use sequence::InMemorySequenceAllocator;
