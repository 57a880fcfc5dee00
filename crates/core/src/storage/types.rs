use std::fmt;

use crate::item::{keys, Item, ItemTypeId};

/// The three read-only projections of the item table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexName {
    /// Hash `EdgeId`, range `TypeReference`.
    Edge,
    /// Hash `Id`, range `TypeReference`.
    IdTypeReference,
    /// Hash `TypeOwnerSpace`, range `ReferenceId`.
    TypeOwnerSpace,
}

impl IndexName {
    pub const ALL: [IndexName; 3] = [Self::Edge, Self::IdTypeReference, Self::TypeOwnerSpace];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Edge => "EdgeIndex",
            Self::IdTypeReference => "IdTypeReferenceIndex",
            Self::TypeOwnerSpace => "TypeOwnerSpaceIndex",
        }
    }

    pub const fn hash_attribute(self) -> &'static str {
        match self {
            Self::Edge => "EdgeId",
            Self::IdTypeReference => "Id",
            Self::TypeOwnerSpace => "TypeOwnerSpace",
        }
    }

    pub const fn range_attribute(self) -> &'static str {
        match self {
            Self::Edge | Self::IdTypeReference => "TypeReference",
            Self::TypeOwnerSpace => "ReferenceId",
        }
    }

    /// The hash value `item` is projected under in this index.
    pub fn hash_key_of(self, item: &Item) -> HashKeyValue {
        match self {
            Self::Edge => HashKeyValue::Text(item.edge_id.clone()),
            Self::IdTypeReference => HashKeyValue::Number(item.id),
            Self::TypeOwnerSpace => HashKeyValue::Text(item.type_owner_space()),
        }
    }

    /// The range value `item` is ordered by in this index.
    pub fn range_key_of(self, item: &Item) -> String {
        match self {
            Self::Edge | Self::IdTypeReference => item.type_reference(),
            Self::TypeOwnerSpace => item.reference_id.clone(),
        }
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hash key value; the id index is keyed by number, the others by string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKeyValue {
    Text(String),
    Number(i64),
}

impl HashKeyValue {
    /// True when this value has the attribute type `index` is keyed by.
    pub fn fits(&self, index: IndexName) -> bool {
        matches!(
            (index, self),
            (IndexName::IdTypeReference, Self::Number(_))
                | (IndexName::Edge | IndexName::TypeOwnerSpace, Self::Text(_))
        )
    }
}

impl fmt::Display for HashKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Number(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for HashKeyValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for HashKeyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for HashKeyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Condition on the range key of an index query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeCondition {
    Equals(String),
    BeginsWith(String),
    /// Inclusive on both ends.
    Between(String, String),
}

impl RangeCondition {
    pub fn matches(&self, range_key: &str) -> bool {
        match self {
            Self::Equals(value) => range_key == value,
            Self::BeginsWith(prefix) => range_key.starts_with(prefix.as_str()),
            Self::Between(low, high) => low.as_str() <= range_key && range_key <= high.as_str(),
        }
    }
}

/// A query against one index projection.
///
/// Results are ordered by range key, ascending unless `descending` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    pub index: IndexName,
    pub hash_key: HashKeyValue,
    pub range: Option<RangeCondition>,
    pub descending: bool,
    pub limit: Option<usize>,
    pub exclude_deleted: bool,
}

impl IndexQuery {
    pub fn new(index: IndexName, hash_key: impl Into<HashKeyValue>) -> Self {
        Self {
            index,
            hash_key: hash_key.into(),
            range: None,
            descending: false,
            limit: None,
            exclude_deleted: false,
        }
    }

    /// Every row sharing the edge id `edge_id`.
    pub fn by_edge(edge_id: impl Into<String>) -> Self {
        Self::new(IndexName::Edge, HashKeyValue::Text(edge_id.into()))
    }

    /// Every facet and relationship stored in the partition `id`.
    pub fn by_id(id: i64) -> Self {
        Self::new(IndexName::IdTypeReference, HashKeyValue::Number(id))
    }

    /// Every item of `type_id` owned by `owner_id` in `workspace_id`.
    pub fn by_type_owner_space(type_id: ItemTypeId, owner_id: i64, workspace_id: i64) -> Self {
        Self::new(
            IndexName::TypeOwnerSpace,
            HashKeyValue::Text(keys::type_owner_space(type_id, owner_id, workspace_id)),
        )
    }

    pub fn with_range(mut self, range: RangeCondition) -> Self {
        self.range = Some(range);
        self
    }

    /// Restricts an edge or id query to a single item type.
    pub fn of_type(self, type_id: ItemTypeId) -> Self {
        self.with_range(RangeCondition::BeginsWith(keys::type_reference_prefix(
            type_id,
        )))
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn exclude_deleted(mut self) -> Self {
        self.exclude_deleted = true;
        self
    }

    /// True when `item` belongs to the result set, ignoring order and limit.
    pub fn matches(&self, item: &Item) -> bool {
        if self.index.hash_key_of(item) != self.hash_key {
            return false;
        }
        if self.exclude_deleted && item.is_deleted() {
            return false;
        }
        self.range
            .as_ref()
            .is_none_or(|range| range.matches(&self.index.range_key_of(item)))
    }
}
