//! Preconditions for conditional writes.
//!
//! A precondition is evaluated by the backing store atomically with the
//! write it guards. When it does not hold the write is rejected and the
//! caller must re-read to learn the winning state.

use serde_json::Value;

use super::Item;

/// A field of the envelope or of its payload that a precondition can test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemField {
    StatusId,
    ReferenceId,
    OwnerId,
    WorkspaceId,
    ModifiedOnUtc,
    DeletedOnUtc,
    /// A top-level payload attribute.
    Attribute(String),
}

impl ItemField {
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Attribute(name.into())
    }

    /// The current value of this field on `item`, `None` when absent.
    pub fn value_of(&self, item: &Item) -> Option<Value> {
        match self {
            Self::StatusId => item.status_id.clone().map(Value::String),
            Self::ReferenceId => Some(Value::String(item.reference_id.clone())),
            Self::OwnerId => Some(Value::from(item.owner_id)),
            Self::WorkspaceId => Some(Value::from(item.workspace_id)),
            Self::ModifiedOnUtc => Some(Value::from(item.modified_on_utc)),
            Self::DeletedOnUtc => item.deleted_on_utc.map(Value::from),
            Self::Attribute(name) => item.payload.get(name).cloned(),
        }
    }
}

/// A condition on the current row that must hold for a write to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    Equals(ItemField, Value),
    Absent(ItemField),
    Exists(ItemField),
    NotDeleted,
    All(Vec<Precondition>),
}

impl Precondition {
    pub fn equals(field: ItemField, value: impl Into<Value>) -> Self {
        Self::Equals(field, value.into())
    }

    pub fn absent(field: ItemField) -> Self {
        Self::Absent(field)
    }

    pub fn exists(field: ItemField) -> Self {
        Self::Exists(field)
    }

    pub fn not_deleted() -> Self {
        Self::NotDeleted
    }

    /// Conjunction of `self` and `other`, flattening nested conjunctions.
    pub fn and(self, other: Precondition) -> Self {
        let mut all = match self {
            Self::All(conditions) => conditions,
            condition => vec![condition],
        };
        match other {
            Self::All(conditions) => all.extend(conditions),
            condition => all.push(condition),
        }
        Self::All(all)
    }

    /// Evaluates the precondition against the current row.
    pub fn holds_for(&self, item: &Item) -> bool {
        match self {
            Self::Equals(field, expected) => field.value_of(item).as_ref() == Some(expected),
            Self::Absent(field) => field.value_of(item).is_none(),
            Self::Exists(field) => field.value_of(item).is_some(),
            Self::NotDeleted => !item.is_deleted(),
            Self::All(conditions) => conditions.iter().all(|c| c.holds_for(item)),
        }
    }
}
