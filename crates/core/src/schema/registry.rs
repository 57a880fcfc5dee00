use crate::storage::IndexName;

use super::{BillingMode, GsiConfig, KeyAttribute, ProjectionType, TableConfig};

/// The physical tables backing the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Items,
    Maps,
    Locks,
    Sequences,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [Self::Items, Self::Maps, Self::Locks, Self::Sequences];

    pub const fn base_name(self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Maps => "maps",
            Self::Locks => "locks",
            Self::Sequences => "sequences",
        }
    }
}

/// Table names derived from a deployment prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableRegistry {
    prefix: String,
}

impl TableRegistry {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Pattern: `<prefix><base_name>`
    pub fn table_name(&self, kind: TableKind) -> String {
        format!("{}{}", self.prefix, kind.base_name())
    }

    pub fn items_table(&self) -> String {
        self.table_name(TableKind::Items)
    }

    pub fn maps_table(&self) -> String {
        self.table_name(TableKind::Maps)
    }

    pub fn locks_table(&self) -> String {
        self.table_name(TableKind::Locks)
    }

    pub fn sequences_table(&self) -> String {
        self.table_name(TableKind::Sequences)
    }

    /// Full configuration of one table, indexes included.
    pub fn table_config(&self, kind: TableKind) -> TableConfig {
        let table_name = self.table_name(kind);
        match kind {
            TableKind::Items => TableConfig {
                table_name,
                partition_key: KeyAttribute::number("Id"),
                sort_key: Some(KeyAttribute::string("EdgeId")),
                gsis: IndexName::ALL.into_iter().map(index_config).collect(),
                billing_mode: BillingMode::PayPerRequest,
                ttl_attribute: None,
            },
            TableKind::Maps => TableConfig {
                table_name,
                partition_key: KeyAttribute::number("Id"),
                sort_key: Some(KeyAttribute::string("EdgeId")),
                gsis: Vec::new(),
                billing_mode: BillingMode::PayPerRequest,
                ttl_attribute: Some("ExpiresAt".to_string()),
            },
            TableKind::Locks => TableConfig {
                table_name,
                partition_key: KeyAttribute::string("Key"),
                sort_key: None,
                gsis: Vec::new(),
                billing_mode: BillingMode::PayPerRequest,
                ttl_attribute: Some("ExpiresAt".to_string()),
            },
            TableKind::Sequences => TableConfig {
                table_name,
                partition_key: KeyAttribute::string("Key"),
                sort_key: None,
                gsis: Vec::new(),
                billing_mode: BillingMode::PayPerRequest,
                ttl_attribute: None,
            },
        }
    }

    /// Configurations of every table, in deploy order.
    pub fn all_tables(&self) -> Vec<TableConfig> {
        TableKind::ALL
            .into_iter()
            .map(|kind| self.table_config(kind))
            .collect()
    }
}

fn index_config(index: IndexName) -> GsiConfig {
    let partition_key = match index {
        IndexName::IdTypeReference => KeyAttribute::number(index.hash_attribute()),
        IndexName::Edge | IndexName::TypeOwnerSpace => KeyAttribute::string(index.hash_attribute()),
    };
    GsiConfig {
        name: index.as_str().to_string(),
        partition_key,
        sort_key: Some(KeyAttribute::string(index.range_attribute())),
        projection: ProjectionType::All,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeType;

    #[test]
    fn test_table_names_use_prefix() {
        let registry = TableRegistry::with_prefix("staging-");

        assert_eq!(registry.items_table(), "staging-items");
        assert_eq!(registry.maps_table(), "staging-maps");
        assert_eq!(registry.locks_table(), "staging-locks");
        assert_eq!(registry.sequences_table(), "staging-sequences");
        assert_eq!(TableRegistry::default().items_table(), "items");
    }

    #[test]
    fn test_items_table_has_three_indexes() {
        let config = TableRegistry::default().table_config(TableKind::Items);

        assert_eq!(config.gsis.len(), 3);
        let by_id = config.gsi("IdTypeReferenceIndex").unwrap();
        assert_eq!(by_id.partition_key, KeyAttribute::number("Id"));
        assert_eq!(by_id.sort_key, Some(KeyAttribute::string("TypeReference")));

        let by_owner = config.gsi("TypeOwnerSpaceIndex").unwrap();
        assert_eq!(by_owner.sort_key, Some(KeyAttribute::string("ReferenceId")));
    }

    #[test]
    fn test_key_attributes_are_deduplicated() {
        let config = TableRegistry::default().table_config(TableKind::Items);
        let names: Vec<&str> = config
            .key_attributes()
            .iter()
            .map(|a| a.name.as_str())
            .collect();

        assert_eq!(
            names,
            vec!["Id", "EdgeId", "TypeReference", "TypeOwnerSpace", "ReferenceId"]
        );
        assert_eq!(config.key_attributes()[0].attribute_type, AttributeType::Number);
    }

    #[test]
    fn test_ttl_tables() {
        let registry = TableRegistry::default();
        assert_eq!(
            registry.table_config(TableKind::Maps).ttl_attribute.as_deref(),
            Some("ExpiresAt")
        );
        assert_eq!(registry.table_config(TableKind::Sequences).ttl_attribute, None);
    }
}
