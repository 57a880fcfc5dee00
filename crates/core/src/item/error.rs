use thiserror::Error;

use super::ItemTypeId;

/// Schema violations detected while constructing or decoding an item envelope.
///
/// These are raised before any write reaches the backing store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
    #[error("Id {0} is below the user-defined range and is not a reserved system id")]
    UnreservedSystemId(i64),
    #[error("Unknown item type: {0}")]
    UnknownType(ItemTypeId),
    #[error("Item type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: ItemTypeId,
        actual: ItemTypeId,
    },
    #[error("Invalid payload for {type_name}: {reason}")]
    InvalidPayload {
        type_name: &'static str,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_display() {
        let error = ItemError::MissingField("WorkspaceId");
        assert_eq!(error.to_string(), "Missing required field: WorkspaceId");
    }

    #[test]
    fn test_type_mismatch_display() {
        let error = ItemError::TypeMismatch {
            expected: ItemTypeId(7),
            actual: ItemTypeId(9),
        };
        assert_eq!(error.to_string(), "Item type mismatch: expected 7, found 9");
    }

    #[test]
    fn test_unreserved_system_id_display() {
        let error = ItemError::UnreservedSystemId(42);
        assert_eq!(
            error.to_string(),
            "Id 42 is below the user-defined range and is not a reserved system id"
        );
    }
}
