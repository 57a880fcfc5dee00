use serde_json::Value;

use super::Payload;

/// A declarative mutation of an item's non-key fields.
///
/// Keys, `TypeId`, ownership and the soft-delete marker are deliberately not
/// reachable from here; they have their own explicit operations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemUpdate {
    /// `Some(None)` removes the status attribute from the row.
    pub status: Option<Option<String>>,
    pub reference_id: Option<String>,
    pub set_attributes: Payload,
    pub remove_attributes: Vec<String>,
}

impl ItemUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(mut self, status_id: impl Into<String>) -> Self {
        self.status = Some(Some(status_id.into()));
        self
    }

    pub fn clear_status(mut self) -> Self {
        self.status = Some(None);
        self
    }

    pub fn set_reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    pub fn set_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        self.remove_attributes.retain(|existing| existing != &name);
        self.set_attributes.insert(name, value.into());
        self
    }

    pub fn remove_attribute(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.set_attributes.remove(&name);
        if !self.remove_attributes.contains(&name) {
            self.remove_attributes.push(name);
        }
        self
    }

    /// True when applying the update would only touch the audit fields.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.reference_id.is_none()
            && self.set_attributes.is_empty()
            && self.remove_attributes.is_empty()
    }
}
