//! Type-specific payload decoding.
//!
//! The envelope is fixed; what varies per entity kind is the payload. Each
//! kind implements [`ItemPayload`] and is declared once in a
//! [`TypeRegistry`], which maps a `TypeId` to its payload validator.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{Item, ItemError, ItemTypeId, Payload};

/// A payload shape bound to exactly one item type.
pub trait ItemPayload: Serialize + DeserializeOwned {
    const TYPE_ID: ItemTypeId;
    const NAME: &'static str;
}

/// Encodes a typed payload into the attribute map stored on the envelope.
pub fn encode_payload<P: ItemPayload>(payload: &P) -> Result<Payload, ItemError> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ItemError::InvalidPayload {
            type_name: P::NAME,
            reason: "payload must serialize to an object".to_string(),
        }),
        Err(e) => Err(ItemError::InvalidPayload {
            type_name: P::NAME,
            reason: e.to_string(),
        }),
    }
}

/// Decodes the payload of `item` as `P`, checking the type discriminator first.
pub fn decode_payload<P: ItemPayload>(item: &Item) -> Result<P, ItemError> {
    if item.type_id != P::TYPE_ID {
        return Err(ItemError::TypeMismatch {
            expected: P::TYPE_ID,
            actual: item.type_id,
        });
    }
    decode_as::<P>(&item.payload)
}

impl Item {
    /// Decodes this item's payload as `P`. See [`decode_payload`].
    pub fn decode_payload<P: ItemPayload>(&self) -> Result<P, ItemError> {
        decode_payload(self)
    }
}

fn decode_as<P: ItemPayload>(payload: &Payload) -> Result<P, ItemError> {
    serde_json::from_value(Value::Object(payload.clone())).map_err(|e| ItemError::InvalidPayload {
        type_name: P::NAME,
        reason: e.to_string(),
    })
}

fn validate_as<P: ItemPayload>(payload: &Payload) -> Result<(), ItemError> {
    decode_as::<P>(payload).map(|_| ())
}

fn accept_any(_payload: &Payload) -> Result<(), ItemError> {
    Ok(())
}

type PayloadValidator = fn(&Payload) -> Result<(), ItemError>;

/// A registered entity kind.
#[derive(Debug, Clone, Copy)]
pub struct TypeDescriptor {
    pub type_id: ItemTypeId,
    pub name: &'static str,
    validator: PayloadValidator,
}

impl TypeDescriptor {
    pub fn validate(&self, payload: &Payload) -> Result<(), ItemError> {
        (self.validator)(payload)
    }
}

/// Explicit table of the entity kinds allowed in the item table.
///
/// Built once at startup and handed to the store; writes of unregistered
/// kinds are rejected as schema violations.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<ItemTypeId, TypeDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kind whose payload must decode as `P`.
    pub fn register<P: ItemPayload>(mut self) -> Self {
        self.types.insert(
            P::TYPE_ID,
            TypeDescriptor {
                type_id: P::TYPE_ID,
                name: P::NAME,
                validator: validate_as::<P>,
            },
        );
        self
    }

    /// Registers a kind that carries no payload schema (relationship rows,
    /// markers).
    pub fn register_untyped(mut self, type_id: ItemTypeId, name: &'static str) -> Self {
        self.types.insert(
            type_id,
            TypeDescriptor {
                type_id,
                name,
                validator: accept_any,
            },
        );
        self
    }

    pub fn get(&self, type_id: ItemTypeId) -> Option<&TypeDescriptor> {
        self.types.get(&type_id)
    }

    pub fn name_of(&self, type_id: ItemTypeId) -> Option<&'static str> {
        self.get(type_id).map(|descriptor| descriptor.name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Checks that `type_id` is registered and that `payload` fits its shape.
    pub fn validate(&self, type_id: ItemTypeId, payload: &Payload) -> Result<(), ItemError> {
        self.get(type_id)
            .ok_or(ItemError::UnknownType(type_id))?
            .validate(payload)
    }
}
