mod error;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use traits::{ItemRepository, MapRepository};
pub use types::{HashKeyValue, IndexName, IndexQuery, RangeCondition};
