//! Cache-aside decorators for repository implementations.

mod map;

pub use map::CachedMapRepository;
