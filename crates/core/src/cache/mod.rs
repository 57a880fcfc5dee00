//! Cache vocabulary for read-through decorators over the repositories.

mod error;
mod keys;
mod patterns;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{map_key, map_partition_pattern};
pub use patterns::pattern_matches;
pub use serialization::{deserialize_map_entry, serialize_map_entry};
pub use traits::Cache;
