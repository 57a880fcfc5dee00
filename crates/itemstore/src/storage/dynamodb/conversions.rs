//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and
//! core types. These are testable in isolation without DynamoDB access.

use std::collections::HashMap;
use std::str::FromStr;

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Number, Value};

use itemstore_core::auxmap::AuxMapEntry;
use itemstore_core::item::{Item, ItemTypeId, Payload};
use itemstore_core::lock::LockLease;
use itemstore_core::storage::{HashKeyValue, RepositoryError};

use super::attributes::*;

pub type AttributeMap = HashMap<String, AttributeValue>;

pub fn number(value: impl ToString) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

pub fn string(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

pub fn hash_key_value(value: &HashKeyValue) -> AttributeValue {
    match value {
        HashKeyValue::Text(text) => string(text.as_str()),
        HashKeyValue::Number(n) => number(n),
    }
}

// ============================================================================
// Keys
// ============================================================================

/// Primary key of a row in the items or maps table.
pub fn item_key(id: i64, edge_id: &str) -> AttributeMap {
    HashMap::from([
        (ID.to_string(), number(id)),
        (EDGE_ID.to_string(), string(edge_id)),
    ])
}

/// Primary key of a row in the locks or sequences table.
pub fn named_key(key: &str) -> AttributeMap {
    HashMap::from([(KEY.to_string(), string(key))])
}

// ============================================================================
// Item conversions
// ============================================================================

/// Convert an Item to a DynamoDB row, index keys included.
pub fn item_to_attributes(item: &Item) -> AttributeMap {
    let mut row = item_key(item.id, &item.edge_id);

    // Index keys
    row.insert(TYPE_REFERENCE.to_string(), string(item.type_reference()));
    row.insert(TYPE_OWNER_SPACE.to_string(), string(item.type_owner_space()));

    // Envelope
    row.insert(TYPE_ID.to_string(), number(item.type_id));
    row.insert(REFERENCE_ID.to_string(), string(item.reference_id.as_str()));
    row.insert(OWNER_ID.to_string(), number(item.owner_id));
    row.insert(WORKSPACE_ID.to_string(), number(item.workspace_id));
    row.insert(CREATED_BY.to_string(), number(item.created_by));
    row.insert(
        CREATED_WORKSPACE_ID.to_string(),
        number(item.created_workspace_id),
    );
    row.insert(MODIFIED_BY.to_string(), number(item.modified_by));
    row.insert(
        MODIFIED_WORKSPACE_ID.to_string(),
        number(item.modified_workspace_id),
    );
    row.insert(CREATED_ON_UTC.to_string(), number(item.created_on_utc));
    row.insert(MODIFIED_ON_UTC.to_string(), number(item.modified_on_utc));

    // Optional attributes are omitted when absent
    if let Some(deleted_on) = item.deleted_on_utc {
        row.insert(DELETED_ON_UTC.to_string(), number(deleted_on));
    }
    if let Some(deleted_by) = item.deleted_by {
        row.insert(DELETED_BY.to_string(), number(deleted_by));
    }
    if let Some(deleted_ws) = item.deleted_by_workspace_id {
        row.insert(DELETED_BY_WORKSPACE_ID.to_string(), number(deleted_ws));
    }
    if let Some(status) = &item.status_id {
        row.insert(STATUS_ID.to_string(), string(status.as_str()));
    }

    row.insert(PAYLOAD.to_string(), payload_to_attribute(&item.payload));
    row
}

/// Convert a DynamoDB row to an Item.
pub fn attributes_to_item(row: &AttributeMap) -> Result<Item, RepositoryError> {
    let payload = match row.get(PAYLOAD) {
        Some(AttributeValue::M(map)) => attribute_map_to_payload(map)?,
        Some(_) => {
            return Err(RepositoryError::InvalidData(format!(
                "Invalid field: {PAYLOAD} is not a map"
            )))
        }
        None => Payload::new(),
    };

    Ok(Item {
        id: get_number(row, ID)?,
        edge_id: get_string(row, EDGE_ID)?,
        type_id: ItemTypeId(get_number(row, TYPE_ID)?),
        reference_id: get_string(row, REFERENCE_ID)?,
        workspace_id: get_number(row, WORKSPACE_ID)?,
        owner_id: get_number(row, OWNER_ID)?,
        created_by: get_number(row, CREATED_BY)?,
        created_workspace_id: get_number(row, CREATED_WORKSPACE_ID)?,
        modified_by: get_number(row, MODIFIED_BY)?,
        modified_workspace_id: get_number(row, MODIFIED_WORKSPACE_ID)?,
        created_on_utc: get_number(row, CREATED_ON_UTC)?,
        modified_on_utc: get_number(row, MODIFIED_ON_UTC)?,
        deleted_on_utc: get_optional_number(row, DELETED_ON_UTC)?,
        deleted_by: get_optional_number(row, DELETED_BY)?,
        deleted_by_workspace_id: get_optional_number(row, DELETED_BY_WORKSPACE_ID)?,
        status_id: get_optional_string(row, STATUS_ID),
        payload,
    })
}

// ============================================================================
// Aux map conversions
// ============================================================================

pub fn entry_to_attributes(entry: &AuxMapEntry) -> AttributeMap {
    let mut row = item_key(entry.id, &entry.edge_id);
    row.insert(REFERENCE_NUMBER.to_string(), number(entry.reference_number));
    row.insert(
        MAPPED_ITEM_EDGE_ID.to_string(),
        string(entry.mapped_item_edge_id.as_str()),
    );
    // Native TTL only sweeps rows that carry the attribute
    if entry.expires() {
        row.insert(EXPIRES_AT.to_string(), number(entry.expires_at));
    }
    row
}

pub fn attributes_to_entry(row: &AttributeMap) -> Result<AuxMapEntry, RepositoryError> {
    Ok(AuxMapEntry {
        id: get_number(row, ID)?,
        edge_id: get_string(row, EDGE_ID)?,
        reference_number: get_number(row, REFERENCE_NUMBER)?,
        mapped_item_edge_id: get_string(row, MAPPED_ITEM_EDGE_ID)?,
        expires_at: get_optional_number(row, EXPIRES_AT)?.unwrap_or(0),
    })
}

// ============================================================================
// Lock conversions
// ============================================================================

pub fn lease_to_attributes(lease: &LockLease) -> AttributeMap {
    let mut row = named_key(&lease.key);
    row.insert(OWNER_TOKEN.to_string(), string(lease.owner_token.as_str()));
    row.insert(CREATED_ON.to_string(), number(lease.created_on));
    row.insert(LAST_HEARTBEAT_ON.to_string(), number(lease.last_heartbeat_on));
    row.insert(
        LOCK_DURATION_SECONDS.to_string(),
        number(lease.lock_duration_seconds),
    );
    row.insert(MACHINE_NAME.to_string(), string(lease.machine_name.as_str()));
    row.insert(EXPIRES_AT.to_string(), number(lease.expires_at()));
    row
}

pub fn attributes_to_lease(row: &AttributeMap) -> Result<LockLease, RepositoryError> {
    Ok(LockLease {
        key: get_string(row, KEY)?,
        owner_token: get_string(row, OWNER_TOKEN)?,
        created_on: get_number(row, CREATED_ON)?,
        last_heartbeat_on: get_number(row, LAST_HEARTBEAT_ON)?,
        lock_duration_seconds: get_number(row, LOCK_DURATION_SECONDS)?,
        machine_name: get_optional_string(row, MACHINE_NAME).unwrap_or_default(),
    })
}

// ============================================================================
// Payload conversions
// ============================================================================

pub fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => number(n),
        Value::String(s) => string(s.as_str()),
        Value::Array(values) => AttributeValue::L(values.iter().map(json_to_attribute).collect()),
        Value::Object(map) => payload_to_attribute(map),
    }
}

pub fn payload_to_attribute(payload: &Payload) -> AttributeValue {
    AttributeValue::M(
        payload
            .iter()
            .map(|(name, value)| (name.clone(), json_to_attribute(value)))
            .collect(),
    )
}

pub fn attribute_to_json(value: &AttributeValue) -> Result<Value, RepositoryError> {
    match value {
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
        AttributeValue::N(n) => parse_json_number(n),
        AttributeValue::S(s) => Ok(Value::String(s.clone())),
        AttributeValue::L(values) => values
            .iter()
            .map(attribute_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeValue::M(map) => attribute_map_to_payload(map).map(Value::Object),
        other => Err(RepositoryError::InvalidData(format!(
            "Unsupported payload attribute: {:?}",
            other
        ))),
    }
}

fn attribute_map_to_payload(map: &AttributeMap) -> Result<Payload, RepositoryError> {
    map.iter()
        .map(|(name, value)| Ok((name.clone(), attribute_to_json(value)?)))
        .collect()
}

fn parse_json_number(n: &str) -> Result<Value, RepositoryError> {
    if let Ok(i) = n.parse::<i64>() {
        return Ok(Value::from(i));
    }
    if let Ok(u) = n.parse::<u64>() {
        return Ok(Value::from(u));
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| RepositoryError::InvalidData(format!("Invalid number: {}", n)))
}

// ============================================================================
// Field accessors
// ============================================================================

/// Get a required string attribute.
fn get_string(row: &AttributeMap, key: &str) -> Result<String, RepositoryError> {
    row.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| RepositoryError::InvalidData(format!("Missing or invalid field: {}", key)))
}

/// Get an optional string attribute.
fn get_optional_string(row: &AttributeMap, key: &str) -> Option<String> {
    row.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
}

/// Get a required numeric attribute.
pub fn get_number<T: FromStr>(row: &AttributeMap, key: &str) -> Result<T, RepositoryError> {
    get_optional_number(row, key)?
        .ok_or_else(|| RepositoryError::InvalidData(format!("Missing field: {}", key)))
}

/// Get an optional numeric attribute; present but malformed is an error.
fn get_optional_number<T: FromStr>(
    row: &AttributeMap,
    key: &str,
) -> Result<Option<T>, RepositoryError> {
    match row.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_n()
            .ok()
            .and_then(|n| n.parse::<T>().ok())
            .map(Some)
            .ok_or_else(|| RepositoryError::InvalidData(format!("Invalid number field: {}", key))),
    }
}
