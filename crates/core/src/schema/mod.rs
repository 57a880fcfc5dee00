//! Physical table and index layout.
//!
//! Built explicitly from a table name prefix and handed to backends and the
//! deploy tooling. There is no process-wide registry.

mod config;
mod registry;

pub use config::{AttributeType, BillingMode, GsiConfig, KeyAttribute, ProjectionType, TableConfig};
pub use registry::{TableKind, TableRegistry};
