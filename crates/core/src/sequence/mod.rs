//! Identifier allocation.
//!
//! Ids below [`MIN_USER_DEFINED_OBJECT_ID`] belong to fixed system entities
//! listed in [`ReservedId`]; everything else is issued by a
//! [`SequenceAllocator`].

mod reserved;
mod traits;

pub use reserved::{
    is_reserved_id, ReservedId, GLOBAL_SEQUENCE_KEY, MIN_USER_DEFINED_OBJECT_ID,
};
pub use traits::{bootstrap_global_sequence, SequenceAllocator};
