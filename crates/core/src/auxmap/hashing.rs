use xxhash_rust::xxh64::xxh64;

use crate::item::{keys, ItemTypeId};

/// Partition id of the map entry for `external_key`.
///
/// 64-bit xxHash with seed 0 over the UTF-8 bytes, reinterpreted as `i64`.
/// The value is persisted, so the algorithm must never change.
pub fn map_id(external_key: &str) -> i64 {
    xxh64(external_key.as_bytes(), 0) as i64
}

/// Sort key of the map entry, disambiguating hash collisions.
///
/// Pattern: `<type_id>|<external_key>`
pub fn map_edge_id(type_id: ItemTypeId, external_key: &str) -> String {
    keys::edge_id(type_id, external_key)
}
