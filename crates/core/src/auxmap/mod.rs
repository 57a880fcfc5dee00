//! Auxiliary mapping table: hashed external key to item key.

mod hashing;
mod types;

pub use hashing::{map_edge_id, map_id};
pub use types::AuxMapEntry;
