//! Core abstractions shared by every replication stage.
//!
//! - [`schema`]: field and table metadata types
//! - [`value`]: store-agnostic field value representation
//! - [`mapping`]: ordered field mappings and row projection
//!
//! Stores (`store::memory`, `store::sqlite`) implement the storage seam over
//! these types; everything above them (replication, pipelines, reports) is
//! store-agnostic.

pub mod mapping;
pub mod schema;
pub mod value;

// Re-export commonly used types for convenience
pub use mapping::{FieldMap, FieldMapEntry, Projection};
pub use schema::{FieldDef, FieldType, TableSchema};
pub use value::{FieldValue, Row};
