/// Returns the cache key for a single map entry.
///
/// Pattern: `map:<id>:<edge_id>`
pub fn map_key(id: i64, edge_id: &str) -> String {
    format!("map:{id}:{edge_id}")
}

/// Returns the pattern matching every cached map entry in partition `id`.
pub fn map_partition_pattern(id: i64) -> String {
    format!("map:{id}:*")
}
