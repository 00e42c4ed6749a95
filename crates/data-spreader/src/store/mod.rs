//! Staging store implementations.
//!
//! A tier's data lives behind [`DatasetStore`], the one seam between
//! replication logic and storage. Two implementations exist:
//!
//! - [`memory`]: in-process tables; dry runs and tests
//! - [`sqlite`]: file-backed staging stores
//!
//! Dispatch goes through the [`StoreImpl`] enum rather than `Box<dyn ...>`;
//! the compiler generates a match statement and the call site stays a plain
//! value type.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::catalog::{AttributeDomain, DomainUsage, RelationshipClass};
use crate::config::{TierConfig, TierKind};
use crate::core::schema::TableSchema;
use crate::core::value::Row;
use crate::error::{Result, SpreadError};
use std::sync::{Mutex, MutexGuard};

/// Helper to acquire a store mutex with poison recovery.
///
/// If the mutex is poisoned by a panic in an earlier critical section, the
/// inner value is recovered and a warning logged; the connection state is
/// still usable and one broken run should not cascade.
pub(crate) fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("store mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// The storage seam a tier exposes to replication and reporting.
///
/// Every operation is synchronous and takes `&self`; implementations guard
/// their connection or tables with a mutex so a resolved handle can be used
/// directly.
pub trait DatasetStore {
    /// Whether a table exists.
    fn table_exists(&self, table: &str) -> Result<bool>;

    /// Read a table's schema.
    fn table_schema(&self, table: &str) -> Result<TableSchema>;

    /// Create the table when missing; existing tables are left untouched.
    fn ensure_table(&self, schema: &TableSchema) -> Result<()>;

    /// Delete all rows of a table.
    fn truncate(&self, table: &str) -> Result<()>;

    /// Bulk-insert rows into the named fields, returning rows written.
    fn append(&self, table: &str, fields: &[String], rows: &[Row]) -> Result<u64>;

    /// Read rows in schema column order, deterministically ordered.
    fn read_rows(&self, table: &str, offset: u64, limit: u64) -> Result<Vec<Row>>;

    /// Current row count of a table.
    fn row_count(&self, table: &str) -> Result<u64>;

    /// Attribute domains from the store's catalog side tables; empty when
    /// the store carries none.
    fn domains(&self) -> Result<Vec<AttributeDomain>>;

    /// Relationship classes from the catalog side tables.
    fn relationship_classes(&self) -> Result<Vec<RelationshipClass>>;

    /// Field/domain references from the catalog side tables.
    fn domain_usage(&self) -> Result<Vec<DomainUsage>>;

    /// Post-load maintenance (VACUUM for sqlite, no-op for memory).
    fn compact(&self) -> Result<()>;
}

/// Enum-based static dispatch over the store implementations.
#[derive(Debug)]
pub enum StoreImpl {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl StoreImpl {
    /// Open the store backing a tier.
    pub fn open(tier_name: &str, tier: &TierConfig) -> Result<Self> {
        match tier.kind {
            TierKind::Memory => Ok(StoreImpl::Memory(MemoryStore::new())),
            TierKind::Sqlite => {
                let path = tier.path.as_ref().ok_or_else(|| {
                    SpreadError::Config(format!("tier '{}' is sqlite and requires a path", tier_name))
                })?;
                Ok(StoreImpl::Sqlite(SqliteStore::open(path)?))
            }
        }
    }
}

impl DatasetStore for StoreImpl {
    fn table_exists(&self, table: &str) -> Result<bool> {
        match self {
            StoreImpl::Memory(s) => s.table_exists(table),
            StoreImpl::Sqlite(s) => s.table_exists(table),
        }
    }

    fn table_schema(&self, table: &str) -> Result<TableSchema> {
        match self {
            StoreImpl::Memory(s) => s.table_schema(table),
            StoreImpl::Sqlite(s) => s.table_schema(table),
        }
    }

    fn ensure_table(&self, schema: &TableSchema) -> Result<()> {
        match self {
            StoreImpl::Memory(s) => s.ensure_table(schema),
            StoreImpl::Sqlite(s) => s.ensure_table(schema),
        }
    }

    fn truncate(&self, table: &str) -> Result<()> {
        match self {
            StoreImpl::Memory(s) => s.truncate(table),
            StoreImpl::Sqlite(s) => s.truncate(table),
        }
    }

    fn append(&self, table: &str, fields: &[String], rows: &[Row]) -> Result<u64> {
        match self {
            StoreImpl::Memory(s) => s.append(table, fields, rows),
            StoreImpl::Sqlite(s) => s.append(table, fields, rows),
        }
    }

    fn read_rows(&self, table: &str, offset: u64, limit: u64) -> Result<Vec<Row>> {
        match self {
            StoreImpl::Memory(s) => s.read_rows(table, offset, limit),
            StoreImpl::Sqlite(s) => s.read_rows(table, offset, limit),
        }
    }

    fn row_count(&self, table: &str) -> Result<u64> {
        match self {
            StoreImpl::Memory(s) => s.row_count(table),
            StoreImpl::Sqlite(s) => s.row_count(table),
        }
    }

    fn domains(&self) -> Result<Vec<AttributeDomain>> {
        match self {
            StoreImpl::Memory(s) => s.domains(),
            StoreImpl::Sqlite(s) => s.domains(),
        }
    }

    fn relationship_classes(&self) -> Result<Vec<RelationshipClass>> {
        match self {
            StoreImpl::Memory(s) => s.relationship_classes(),
            StoreImpl::Sqlite(s) => s.relationship_classes(),
        }
    }

    fn domain_usage(&self) -> Result<Vec<DomainUsage>> {
        match self {
            StoreImpl::Memory(s) => s.domain_usage(),
            StoreImpl::Sqlite(s) => s.domain_usage(),
        }
    }

    fn compact(&self) -> Result<()> {
        match self {
            StoreImpl::Memory(s) => s.compact(),
            StoreImpl::Sqlite(s) => s.compact(),
        }
    }
}
