mod condition;
mod error;
pub mod keys;
mod operations;
mod payload;
mod types;
mod update;

pub use condition::{ItemField, Precondition};
pub use error::ItemError;
pub use operations::{
    apply_restore, apply_soft_delete, apply_transfer, apply_update, build_item, validate_new_item,
    validate_update,
};
pub use payload::{decode_payload, encode_payload, ItemPayload, TypeDescriptor, TypeRegistry};
pub use types::{AuditStamp, Item, ItemKey, ItemTypeId, NewItem, Payload};
pub use update::ItemUpdate;
