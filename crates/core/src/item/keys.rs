//! Key builders for the single-table design.
//!
//! Pure functions that derive `EdgeId`, `TypeReference` and `TypeOwnerSpace`
//! so that every writer and reader produces identical strings. Changing any
//! format here is a schema change: existing rows are not re-derived.

use super::ItemTypeId;

// ============================================================================
// Separators
// ============================================================================

pub const KEY_SEPARATOR: char = '|';

/// Width of zero-padded numeric references, enough for any positive `i64`.
pub const NUMERIC_REFERENCE_WIDTH: usize = 19;

// ============================================================================
// Edge keys
// ============================================================================

/// Generate the sort key of an item.
///
/// Pattern: `<type_id>|<qualifier>`
pub fn edge_id(type_id: ItemTypeId, qualifier: &str) -> String {
    format!("{type_id}{KEY_SEPARATOR}{qualifier}")
}

/// Generate the sort key of an item that describes the partition's own entity.
///
/// Pattern: `<type_id>|<id>`
pub fn self_edge_id(type_id: ItemTypeId, id: i64) -> String {
    edge_id(type_id, &id.to_string())
}

/// Split an edge id back into its type and qualifier.
///
/// Returns `None` when the leading segment is not a type id.
pub fn parse_edge_id(edge_id: &str) -> Option<(ItemTypeId, &str)> {
    let (type_part, qualifier) = edge_id.split_once(KEY_SEPARATOR)?;
    let type_id = type_part.parse::<i32>().ok()?;
    Some((ItemTypeId(type_id), qualifier))
}

// ============================================================================
// Index keys
// ============================================================================

/// Generate the range value used by the edge and id indexes.
///
/// Pattern: `<type_id>|<reference>`
pub fn type_reference(type_id: ItemTypeId, reference: &str) -> String {
    format!("{type_id}{KEY_SEPARATOR}{reference}")
}

/// Generate the `begins_with` prefix matching every reference of a type.
///
/// Pattern: `<type_id>|`
pub fn type_reference_prefix(type_id: ItemTypeId) -> String {
    format!("{type_id}{KEY_SEPARATOR}")
}

/// Generate the hash value of the owner index.
///
/// Pattern: `<type_id>|<owner_id>|<workspace_id>`
pub fn type_owner_space(type_id: ItemTypeId, owner_id: i64, workspace_id: i64) -> String {
    format!("{type_id}{KEY_SEPARATOR}{owner_id}{KEY_SEPARATOR}{workspace_id}")
}

/// Render a numeric reference so that lexicographic order matches numeric order.
///
/// Only non-negative values sort correctly.
pub fn numeric_reference(value: i64) -> String {
    format!("{value:0width$}", width = NUMERIC_REFERENCE_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_id() {
        assert_eq!(edge_id(ItemTypeId(7), "apikey"), "7|apikey");
    }

    #[test]
    fn test_self_edge_id() {
        assert_eq!(self_edge_id(ItemTypeId(12), 125_151), "12|125151");
    }

    #[test]
    fn test_parse_edge_id() {
        assert_eq!(
            parse_edge_id("7|user|42"),
            Some((ItemTypeId(7), "user|42"))
        );
        assert_eq!(parse_edge_id("seven|42"), None);
        assert_eq!(parse_edge_id("no-separator"), None);
    }

    #[test]
    fn test_type_reference() {
        assert_eq!(type_reference(ItemTypeId(7), "abc"), "7|abc");
        assert_eq!(type_reference_prefix(ItemTypeId(7)), "7|");
    }

    #[test]
    fn test_type_reference_prefix_does_not_match_longer_type_ids() {
        let prefix = type_reference_prefix(ItemTypeId(7));
        assert!(!type_reference(ItemTypeId(70), "abc").starts_with(&prefix));
    }

    #[test]
    fn test_type_owner_space() {
        assert_eq!(type_owner_space(ItemTypeId(3), 100_001, 2), "3|100001|2");
    }

    #[test]
    fn test_numeric_reference_sorts_numerically() {
        let small = numeric_reference(9);
        let large = numeric_reference(10);
        assert_eq!(small.len(), NUMERIC_REFERENCE_WIDTH);
        assert!(small < large);
        assert_eq!(numeric_reference(i64::MAX), i64::MAX.to_string());
    }
}
