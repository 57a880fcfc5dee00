use serde::{Deserialize, Serialize};

use crate::item::{ItemKey, ItemTypeId};

use super::{map_edge_id, map_id};

/// A row of the mapping table pointing an external key at an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuxMapEntry {
    pub id: i64,
    pub edge_id: String,
    /// Id of the target item.
    pub reference_number: i64,
    /// Edge id of the target item.
    pub mapped_item_edge_id: String,
    /// Unix seconds; zero or negative never expires.
    #[serde(default)]
    pub expires_at: i64,
}

impl AuxMapEntry {
    /// Maps `external_key` of kind `type_id` to `target`.
    pub fn new(type_id: ItemTypeId, external_key: &str, target: &ItemKey) -> Self {
        Self {
            id: map_id(external_key),
            edge_id: map_edge_id(type_id, external_key),
            reference_number: target.id,
            mapped_item_edge_id: target.edge_id.clone(),
            expires_at: 0,
        }
    }

    pub fn expiring_at(mut self, expires_at: i64) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Lookup key of the entry for `external_key` of kind `type_id`.
    pub fn key_for(type_id: ItemTypeId, external_key: &str) -> ItemKey {
        ItemKey::new(map_id(external_key), map_edge_id(type_id, external_key))
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.id, self.edge_id.clone())
    }

    pub fn target(&self) -> ItemKey {
        ItemKey::new(self.reference_number, self.mapped_item_edge_id.clone())
    }

    pub fn expires(&self) -> bool {
        self.expires_at > 0
    }

    /// Expired entries are treated as absent by every reader.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires() && self.expires_at <= now
    }

    /// Seconds until expiry, `None` for entries that never expire.
    pub fn seconds_remaining(&self, now: i64) -> Option<i64> {
        self.expires().then(|| (self.expires_at - now).max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AuxMapEntry {
        AuxMapEntry::new(
            ItemTypeId(21),
            "sk_live_abc",
            &ItemKey::new(125_151, "1|125151"),
        )
    }

    #[test]
    fn test_new_entry_keys() {
        let entry = sample();

        assert_eq!(entry.key(), AuxMapEntry::key_for(ItemTypeId(21), "sk_live_abc"));
        assert_eq!(entry.edge_id, "21|sk_live_abc");
        assert_eq!(entry.target(), ItemKey::new(125_151, "1|125151"));
        assert!(!entry.expires());
    }

    #[test]
    fn test_expiry_boundaries() {
        let entry = sample().expiring_at(1_000);

        assert!(!entry.is_expired(999));
        assert!(entry.is_expired(1_000));
        assert!(entry.is_expired(1_001));
        assert_eq!(entry.seconds_remaining(990), Some(10));
        assert_eq!(entry.seconds_remaining(2_000), Some(0));
    }

    #[test]
    fn test_non_positive_expiry_never_expires() {
        assert!(!sample().is_expired(i64::MAX));
        assert!(!sample().expiring_at(-5).is_expired(i64::MAX));
        assert_eq!(sample().seconds_remaining(10), None);
    }
}
