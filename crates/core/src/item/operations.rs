//! Pure envelope operations: construction, validation and the state
//! transitions that backends apply in place.

use crate::sequence::{is_reserved_id, MIN_USER_DEFINED_OBJECT_ID};

use super::{keys, AuditStamp, Item, ItemError, ItemUpdate, NewItem};

/// Validates the fields of a new envelope that do not depend on its id.
pub fn validate_new_item(new: &NewItem) -> Result<(), ItemError> {
    if new.type_id.value() <= 0 {
        return Err(ItemError::InvalidField {
            field: "TypeId",
            reason: format!("must be positive, got {}", new.type_id),
        });
    }

    let owner_id = new.owner_id.ok_or(ItemError::MissingField("OwnerId"))?;
    let workspace_id = new
        .workspace_id
        .ok_or(ItemError::MissingField("WorkspaceId"))?;
    require_positive("OwnerId", owner_id)?;
    require_positive("WorkspaceId", workspace_id)?;

    if let Some(created_by) = new.created_by {
        require_positive("CreatedBy", created_by)?;
    }
    if let Some(created_workspace_id) = new.created_workspace_id {
        require_positive("CreatedWorkspaceId", created_workspace_id)?;
    }

    if let Some(qualifier) = &new.edge_qualifier {
        if qualifier.is_empty() {
            return Err(ItemError::InvalidField {
                field: "EdgeId",
                reason: "qualifier must not be empty".to_string(),
            });
        }
    }
    if let Some(reference_id) = &new.reference_id {
        if reference_id.is_empty() {
            return Err(ItemError::InvalidField {
                field: "ReferenceId",
                reason: "must not be empty".to_string(),
            });
        }
    }

    if let Some(id) = new.id {
        validate_id(id)?;
    }

    Ok(())
}

/// Validates a partial update before it reaches a backend.
///
/// `ReferenceId` is an index range key and may not be emptied.
pub fn validate_update(update: &ItemUpdate) -> Result<(), ItemError> {
    if update.reference_id.as_deref() == Some("") {
        return Err(ItemError::InvalidField {
            field: "ReferenceId",
            reason: "must not be empty".to_string(),
        });
    }
    if let Some(name) = update
        .set_attributes
        .keys()
        .chain(update.remove_attributes.iter())
        .find(|name| name.is_empty())
    {
        return Err(ItemError::InvalidField {
            field: "Payload",
            reason: format!("attribute name must not be empty, got {name:?}"),
        });
    }
    Ok(())
}

/// Builds the persisted envelope for `new` under `id`, stamping creation
/// audit fields with `now`.
///
/// `CreatedOnUtc` and `ModifiedOnUtc` both start at `now`; an empty status
/// is treated as absent.
pub fn build_item(new: NewItem, id: i64, now: i64) -> Result<Item, ItemError> {
    validate_new_item(&new)?;
    validate_id(id)?;
    if let Some(explicit) = new.id {
        if explicit != id {
            return Err(ItemError::InvalidField {
                field: "Id",
                reason: format!("explicit id {explicit} does not match assigned id {id}"),
            });
        }
    }

    let owner_id = new.owner_id.ok_or(ItemError::MissingField("OwnerId"))?;
    let workspace_id = new
        .workspace_id
        .ok_or(ItemError::MissingField("WorkspaceId"))?;
    let created_by = new.created_by.unwrap_or(owner_id);
    let created_workspace_id = new.created_workspace_id.unwrap_or(workspace_id);

    let edge_id = match &new.edge_qualifier {
        Some(qualifier) => keys::edge_id(new.type_id, qualifier),
        None => keys::self_edge_id(new.type_id, id),
    };
    let reference_id = new
        .reference_id
        .unwrap_or_else(|| keys::numeric_reference(id));

    Ok(Item {
        id,
        edge_id,
        type_id: new.type_id,
        reference_id,
        workspace_id,
        owner_id,
        created_by,
        created_workspace_id,
        modified_by: created_by,
        modified_workspace_id: created_workspace_id,
        created_on_utc: now,
        modified_on_utc: now,
        deleted_on_utc: None,
        deleted_by: None,
        deleted_by_workspace_id: None,
        status_id: new.status_id.filter(|status| !status.is_empty()),
        payload: new.payload,
    })
}

/// Applies a non-key mutation and refreshes the modification audit fields.
pub fn apply_update(item: &mut Item, update: &ItemUpdate, stamp: &AuditStamp) {
    if let Some(status) = &update.status {
        item.status_id = status.clone().filter(|s| !s.is_empty());
    }
    if let Some(reference_id) = &update.reference_id {
        item.reference_id = reference_id.clone();
    }
    for name in &update.remove_attributes {
        item.payload.remove(name);
    }
    for (name, value) in &update.set_attributes {
        item.payload.insert(name.clone(), value.clone());
    }
    touch(item, stamp);
}

/// Marks the item deleted. Returns false, leaving the first deletion intact,
/// when it was already deleted. A non-positive stamp cannot mark a deletion
/// and is refused.
pub fn apply_soft_delete(item: &mut Item, stamp: &AuditStamp) -> bool {
    if item.is_deleted() || stamp.on_utc <= 0 {
        return false;
    }
    item.deleted_on_utc = Some(stamp.on_utc);
    item.deleted_by = Some(stamp.user_id);
    item.deleted_by_workspace_id = Some(stamp.workspace_id);
    touch(item, stamp);
    true
}

/// Clears the soft-delete marker. Returns false when the item was not deleted.
pub fn apply_restore(item: &mut Item, stamp: &AuditStamp) -> bool {
    if !item.is_deleted() {
        return false;
    }
    item.deleted_on_utc = None;
    item.deleted_by = None;
    item.deleted_by_workspace_id = None;
    touch(item, stamp);
    true
}

/// Reassigns ownership; the owner index key follows from the new values.
pub fn apply_transfer(item: &mut Item, owner_id: i64, workspace_id: i64, stamp: &AuditStamp) {
    item.owner_id = owner_id;
    item.workspace_id = workspace_id;
    touch(item, stamp);
}

fn touch(item: &mut Item, stamp: &AuditStamp) {
    item.modified_by = stamp.user_id;
    item.modified_workspace_id = stamp.workspace_id;
    item.modified_on_utc = stamp.on_utc;
}

fn validate_id(id: i64) -> Result<(), ItemError> {
    if id <= 0 {
        return Err(ItemError::InvalidField {
            field: "Id",
            reason: format!("must be positive, got {id}"),
        });
    }
    if id < MIN_USER_DEFINED_OBJECT_ID && !is_reserved_id(id) {
        return Err(ItemError::UnreservedSystemId(id));
    }
    Ok(())
}

fn require_positive(field: &'static str, value: i64) -> Result<(), ItemError> {
    if value <= 0 {
        return Err(ItemError::InvalidField {
            field,
            reason: format!("must be positive, got {value}"),
        });
    }
    Ok(())
}
