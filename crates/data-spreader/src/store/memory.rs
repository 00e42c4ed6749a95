//! In-process staging store.
//!
//! Backs `memory` tiers (scratch stages in dry runs) and serves as the test
//! double for replication logic. Tables live in a mutex-guarded map keyed by
//! lowercased name; rows keep insertion order, which is the store's
//! deterministic read order.

use crate::catalog::{AttributeDomain, DomainUsage, RelationshipClass};
use crate::core::schema::TableSchema;
use crate::core::value::{FieldValue, Row};
use crate::error::{Result, SpreadError};
use crate::store::{acquire_lock, DatasetStore};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug)]
struct MemTable {
    schema: TableSchema,
    rows: Vec<Row>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    tables: BTreeMap<String, MemTable>,
    domains: Vec<AttributeDomain>,
    relationship_classes: Vec<RelationshipClass>,
    domain_usage: Vec<DomainUsage>,
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed catalog records, for tests and scratch inventories.
    pub fn set_catalog(
        &self,
        domains: Vec<AttributeDomain>,
        relationship_classes: Vec<RelationshipClass>,
        domain_usage: Vec<DomainUsage>,
    ) {
        let mut inner = acquire_lock(&self.inner);
        inner.domains = domains;
        inner.relationship_classes = relationship_classes;
        inner.domain_usage = domain_usage;
    }

    fn key(table: &str) -> String {
        table.to_ascii_lowercase()
    }
}

impl DatasetStore for MemoryStore {
    fn table_exists(&self, table: &str) -> Result<bool> {
        let inner = acquire_lock(&self.inner);
        Ok(inner.tables.contains_key(&Self::key(table)))
    }

    fn table_schema(&self, table: &str) -> Result<TableSchema> {
        let inner = acquire_lock(&self.inner);
        inner
            .tables
            .get(&Self::key(table))
            .map(|t| t.schema.clone())
            .ok_or_else(|| SpreadError::Config(format!("table '{}' does not exist", table)))
    }

    fn ensure_table(&self, schema: &TableSchema) -> Result<()> {
        let mut inner = acquire_lock(&self.inner);
        inner
            .tables
            .entry(Self::key(&schema.name))
            .or_insert_with(|| MemTable {
                schema: schema.clone(),
                rows: Vec::new(),
            });
        Ok(())
    }

    fn truncate(&self, table: &str) -> Result<()> {
        let mut inner = acquire_lock(&self.inner);
        let t = inner
            .tables
            .get_mut(&Self::key(table))
            .ok_or_else(|| SpreadError::Config(format!("table '{}' does not exist", table)))?;
        t.rows.clear();
        Ok(())
    }

    fn append(&self, table: &str, fields: &[String], rows: &[Row]) -> Result<u64> {
        let mut inner = acquire_lock(&self.inner);
        let t = inner
            .tables
            .get_mut(&Self::key(table))
            .ok_or_else(|| SpreadError::Config(format!("table '{}' does not exist", table)))?;

        // Incoming rows are in `fields` order; place values by schema column.
        let mut placements = Vec::with_capacity(fields.len());
        for field in fields {
            let idx = t.schema.field_index(field).ok_or_else(|| {
                SpreadError::Config(format!("table '{}' has no field '{}'", table, field))
            })?;
            placements.push(idx);
        }

        let width = t.schema.fields.len();
        for row in rows {
            let mut stored = vec![FieldValue::Null; width];
            for (value, &idx) in row.iter().zip(&placements) {
                stored[idx] = value.clone();
            }
            t.rows.push(stored);
        }
        Ok(rows.len() as u64)
    }

    fn read_rows(&self, table: &str, offset: u64, limit: u64) -> Result<Vec<Row>> {
        let inner = acquire_lock(&self.inner);
        let t = inner
            .tables
            .get(&Self::key(table))
            .ok_or_else(|| SpreadError::Config(format!("table '{}' does not exist", table)))?;
        Ok(t.rows
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    fn row_count(&self, table: &str) -> Result<u64> {
        let inner = acquire_lock(&self.inner);
        let t = inner
            .tables
            .get(&Self::key(table))
            .ok_or_else(|| SpreadError::Config(format!("table '{}' does not exist", table)))?;
        Ok(t.rows.len() as u64)
    }

    fn domains(&self) -> Result<Vec<AttributeDomain>> {
        Ok(acquire_lock(&self.inner).domains.clone())
    }

    fn relationship_classes(&self) -> Result<Vec<RelationshipClass>> {
        Ok(acquire_lock(&self.inner).relationship_classes.clone())
    }

    fn domain_usage(&self) -> Result<Vec<DomainUsage>> {
        Ok(acquire_lock(&self.inner).domain_usage.clone())
    }

    fn compact(&self) -> Result<()> {
        Ok(())
    }
}
