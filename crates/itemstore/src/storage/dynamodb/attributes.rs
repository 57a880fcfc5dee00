//! Physical attribute names.
//!
//! Changing a name here is a schema change: rows already written keep the
//! old attribute.

// ============================================================================
// Items table
// ============================================================================

pub const ID: &str = "Id";
pub const EDGE_ID: &str = "EdgeId";
pub const TYPE_ID: &str = "TypeId";
pub const REFERENCE_ID: &str = "ReferenceId";
pub const TYPE_REFERENCE: &str = "TypeReference";
pub const TYPE_OWNER_SPACE: &str = "TypeOwnerSpace";
pub const OWNER_ID: &str = "OwnerId";
pub const WORKSPACE_ID: &str = "WorkspaceId";
pub const CREATED_BY: &str = "CreatedBy";
pub const CREATED_WORKSPACE_ID: &str = "CreatedWorkspaceId";
pub const MODIFIED_BY: &str = "ModifiedBy";
pub const MODIFIED_WORKSPACE_ID: &str = "ModifiedWorkspaceId";
pub const CREATED_ON_UTC: &str = "CreatedOnUtc";
pub const MODIFIED_ON_UTC: &str = "ModifiedOnUtc";
pub const DELETED_ON_UTC: &str = "DeletedOnUtc";
pub const DELETED_BY: &str = "DeletedBy";
pub const DELETED_BY_WORKSPACE_ID: &str = "DeletedByWorkspaceId";
pub const STATUS_ID: &str = "StatusId";
pub const PAYLOAD: &str = "Payload";

// ============================================================================
// Maps table
// ============================================================================

pub const REFERENCE_NUMBER: &str = "ReferenceNumber";
pub const MAPPED_ITEM_EDGE_ID: &str = "MappedItemEdgeId";
pub const EXPIRES_AT: &str = "ExpiresAt";

// ============================================================================
// Locks and sequences tables
// ============================================================================

pub const KEY: &str = "Key";
pub const OWNER_TOKEN: &str = "OwnerToken";
pub const CREATED_ON: &str = "CreatedOn";
pub const LAST_HEARTBEAT_ON: &str = "LastHeartbeatOn";
pub const LOCK_DURATION_SECONDS: &str = "LockDurationSeconds";
pub const MACHINE_NAME: &str = "MachineName";
pub const VALUE: &str = "Value";
