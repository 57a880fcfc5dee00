//! JSON encoding of cached values.

use crate::auxmap::AuxMapEntry;

use super::{CacheError, Result};

/// Serializes a map entry to JSON bytes.
pub fn serialize_map_entry(entry: &AuxMapEntry) -> Result<Vec<u8>> {
    serde_json::to_vec(entry).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Deserializes JSON bytes to a map entry.
pub fn deserialize_map_entry(bytes: &[u8]) -> Result<AuxMapEntry> {
    serde_json::from_slice(bytes).map_err(|e| CacheError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemKey, ItemTypeId};

    #[test]
    fn test_cached_entry_keeps_expiry() {
        let entry = AuxMapEntry::new(ItemTypeId(21), "token", &ItemKey::new(100_001, "1|100001"))
            .expiring_at(1_700_000_000);

        let bytes = serialize_map_entry(&entry).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["expiresAt"], 1_700_000_000);
        assert_eq!(json["referenceNumber"], 100_001);

        assert_eq!(deserialize_map_entry(&bytes).unwrap(), entry);
    }

    #[test]
    fn test_deserialize_invalid_bytes() {
        assert!(matches!(
            deserialize_map_entry(b"not json"),
            Err(CacheError::Serialization(_))
        ));
    }
}
