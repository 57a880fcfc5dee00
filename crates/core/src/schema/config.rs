//! Table configuration types (pure data).

/// Table schema configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub gsis: Vec<GsiConfig>,
    pub billing_mode: BillingMode,
    /// Attribute holding the expiry instant, when the table uses native TTL.
    pub ttl_attribute: Option<String>,
}

/// A key attribute definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

impl KeyAttribute {
    pub fn string(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attribute_type: AttributeType::String,
        }
    }

    pub fn number(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attribute_type: AttributeType::Number,
        }
    }
}

/// Scalar attribute types usable as keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Number,
}

/// Global secondary index configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsiConfig {
    pub name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: Option<KeyAttribute>,
    pub projection: ProjectionType,
}

/// GSI projection type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionType {
    All,
}

/// Billing mode for the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingMode {
    PayPerRequest,
}

impl TableConfig {
    /// Every attribute referenced by the table key or an index key, each once.
    pub fn key_attributes(&self) -> Vec<&KeyAttribute> {
        let mut attributes: Vec<&KeyAttribute> = Vec::new();
        let candidates = std::iter::once(&self.partition_key)
            .chain(self.sort_key.as_ref())
            .chain(
                self.gsis
                    .iter()
                    .flat_map(|gsi| std::iter::once(&gsi.partition_key).chain(gsi.sort_key.as_ref())),
            );
        for attribute in candidates {
            if !attributes.iter().any(|seen| seen.name == attribute.name) {
                attributes.push(attribute);
            }
        }
        attributes
    }

    pub fn gsi(&self, name: &str) -> Option<&GsiConfig> {
        self.gsis.iter().find(|gsi| gsi.name == name)
    }
}
