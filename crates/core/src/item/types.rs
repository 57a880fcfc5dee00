use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::keys;

/// Type-specific attributes carried by an item, decoded per `TypeId`.
pub type Payload = Map<String, Value>;

/// Discriminator identifying which logical entity kind an item row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemTypeId(pub i32);

impl ItemTypeId {
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ItemTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite primary key of an item row: partition `Id`, sort `EdgeId`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemKey {
    pub id: i64,
    pub edge_id: String,
}

impl ItemKey {
    pub fn new(id: i64, edge_id: impl Into<String>) -> Self {
        Self {
            id,
            edge_id: edge_id.into(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.id, self.edge_id)
    }
}

/// Who performed a mutation, from which workspace, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditStamp {
    pub user_id: i64,
    pub workspace_id: i64,
    pub on_utc: i64,
}

impl AuditStamp {
    pub fn new(user_id: i64, workspace_id: i64, on_utc: i64) -> Self {
        Self {
            user_id,
            workspace_id,
            on_utc,
        }
    }
}

/// The canonical polymorphic entity envelope.
///
/// Every entity kind shares this shape in the single physical table; the
/// kind-specific attributes live in `payload` and are decoded by `type_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub edge_id: String,
    pub type_id: ItemTypeId,
    pub reference_id: String,
    pub workspace_id: i64,
    pub owner_id: i64,
    pub created_by: i64,
    pub created_workspace_id: i64,
    pub modified_by: i64,
    pub modified_workspace_id: i64,
    pub created_on_utc: i64,
    pub modified_on_utc: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_on_utc: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by_workspace_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<String>,
    #[serde(default)]
    pub payload: Payload,
}

impl Item {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.id, self.edge_id.clone())
    }

    /// `"{TypeId}|{ReferenceId}"`, the range value of the edge and id indexes.
    pub fn type_reference(&self) -> String {
        keys::type_reference(self.type_id, &self.reference_id)
    }

    /// `"{TypeId}|{OwnerId}|{WorkspaceId}"`, the hash value of the owner index.
    pub fn type_owner_space(&self) -> String {
        keys::type_owner_space(self.type_id, self.owner_id, self.workspace_id)
    }

    /// Logically deleted once `DeletedOnUtc` holds a positive timestamp.
    pub fn is_deleted(&self) -> bool {
        self.deleted_on_utc.is_some_and(|on| on > 0)
    }
}

/// An envelope that has not been persisted yet.
///
/// Required fields are optional here so that a missing value is reported as
/// a schema violation by [`build_item`](super::build_item) instead of being
/// silently defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub type_id: ItemTypeId,
    /// Explicit id; allocated from the sequence when absent.
    pub id: Option<i64>,
    /// Discriminating part of the edge id; the item's own id when absent.
    pub edge_qualifier: Option<String>,
    /// Reference value; the zero-padded id when absent.
    pub reference_id: Option<String>,
    pub owner_id: Option<i64>,
    pub workspace_id: Option<i64>,
    pub created_by: Option<i64>,
    pub created_workspace_id: Option<i64>,
    pub status_id: Option<String>,
    pub payload: Payload,
}

impl NewItem {
    pub fn new(type_id: ItemTypeId) -> Self {
        Self {
            type_id,
            id: None,
            edge_qualifier: None,
            reference_id: None,
            owner_id: None,
            workspace_id: None,
            created_by: None,
            created_workspace_id: None,
            status_id: None,
            payload: Payload::new(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_edge(mut self, qualifier: impl Into<String>) -> Self {
        self.edge_qualifier = Some(qualifier.into());
        self
    }

    pub fn with_reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    pub fn owned_by(mut self, owner_id: i64, workspace_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self.workspace_id = Some(workspace_id);
        self
    }

    /// Sets the creating user and workspace; they default to the owner.
    pub fn created_by(mut self, user_id: i64, workspace_id: i64) -> Self {
        self.created_by = Some(user_id);
        self.created_workspace_id = Some(workspace_id);
        self
    }

    pub fn with_status(mut self, status_id: impl Into<String>) -> Self {
        self.status_id = Some(status_id.into());
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(name.into(), value.into());
        self
    }
}
