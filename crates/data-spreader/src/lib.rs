//! # data-spreader
//!
//! Staged replication and reporting library for a county GIS shop.
//!
//! This library provides the core functionality for moving datasets through
//! named storage tiers and inventorying the surrounding portal, with
//! support for:
//!
//! - **Full-refresh replication** of mapped fields, truncate then bulk copy
//! - **Chained propagation** along tier routes (source -> internal -> public)
//! - **Inventory workbooks** built from catalog objects, exported as
//!   date-stamped CSV directories
//! - **Portal content management**: users, groups, items, item cloning,
//!   service restarts
//!
//! Everything runs synchronously on the calling thread; runs are scheduled
//! jobs where the next step must see the last step's data.
//!
//! ## Example
//!
//! ```rust,no_run
//! use data_spreader::{Config, Spreader};
//!
//! fn main() -> data_spreader::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let spreader = Spreader::new(config)?;
//!     let report = spreader.run(None, false)?;
//!     println!("Copied {} rows", report.rows_copied);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod core;
pub mod error;
pub mod portal;
pub mod replicate;
pub mod report;
pub mod spread;
pub mod store;
pub mod tier;

// Re-exports for convenient access
pub use crate::core::{FieldMap, FieldMapEntry, FieldType, FieldValue, Row, TableSchema};
pub use catalog::{
    orphan_domains, AttributeDomain, DomainUsage, PortalGroup, PortalItem, PortalUser,
    RelationshipClass,
};
pub use config::{Config, DatasetSpec, PipelineSpec, PortalConfig, TierConfig, TierKind};
pub use error::{Result, SpreadError};
pub use portal::{ItemDependency, PortalClient, ServiceInfo};
pub use replicate::{replicate, ReplicationOutcome};
pub use report::{build_sheet, Sheet, Workbook};
pub use spread::{CountCheck, RunReport, Spreader, StageOutcome, StageStatus, TierHealth};
pub use store::{DatasetStore, MemoryStore, SqliteStore, StoreImpl};
pub use tier::TierRegistry;
