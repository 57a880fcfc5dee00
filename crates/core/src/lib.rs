//! Functional core for the itemstore entity storage layer.
//!
//! Everything in this crate is pure data and pure functions: the item
//! envelope and its key builders, the conditional-write vocabulary, the
//! auxiliary map and lock lease models, and the traits that storage backends
//! implement. The `itemstore` crate provides the backends.

pub mod auxmap;
pub mod cache;
pub mod item;
pub mod lock;
pub mod schema;
pub mod sequence;
pub mod storage;
pub mod time;
