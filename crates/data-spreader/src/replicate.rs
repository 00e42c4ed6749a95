//! Single-stage dataset replication.
//!
//! One replication is a full refresh of a dataset on a destination tier from
//! its copy on a source tier: validate the field mapping, truncate the
//! destination, then bulk-copy mapped fields in chunks. The destination is
//! created from the mapping when it does not exist yet. A truncate failure
//! aborts the stage before any row is copied so the destination is never
//! left half-refreshed by this path.

use crate::config::DatasetSpec;
use crate::core::value::Row;
use crate::error::{Result, SpreadError};
use crate::store::DatasetStore;
use tracing::{debug, warn};

/// Row accounting for one completed replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ReplicationOutcome {
    /// Rows read from the source and written to the destination.
    pub rows_copied: u64,
    /// Destination row count after the copy.
    pub dest_rows: u64,
}

/// Refresh `spec` on `dest` from its copy on `source`.
///
/// Steps, in order: resolve per-tier table names, check the source table
/// exists, read its schema, validate the mapping against both schemas,
/// create the destination table if missing, truncate it, copy in chunks of
/// `chunk_size` rows. Returns the rows copied and the destination count
/// observed afterwards; a mismatch between the two is logged, not fatal.
pub fn replicate(
    dest: &dyn DatasetStore,
    source: &dyn DatasetStore,
    spec: &DatasetSpec,
    source_tier: &str,
    dest_tier: &str,
    chunk_size: usize,
) -> Result<ReplicationOutcome> {
    // A chunk of 0 would truncate the destination and then copy nothing.
    let chunk_size = chunk_size.max(1);
    let source_table = spec.table_in(source_tier);
    let dest_table = spec.table_in(dest_tier);
    let mapping = spec.mapping();

    // A dataset pointing at a table the source tier does not have is a
    // configuration problem, not a failed copy.
    if !source.table_exists(source_table)? {
        return Err(SpreadError::Config(format!(
            "dataset '{}': source table '{}' does not exist on tier '{}'",
            spec.name, source_table, source_tier
        )));
    }
    let source_schema = source.table_schema(source_table).map_err(|e| {
        SpreadError::replicate(
            &spec.name,
            format!(
                "cannot read source table '{}' on tier '{}': {}",
                source_table, source_tier, e
            ),
        )
    })?;

    let dest_exists = dest.table_exists(dest_table)?;
    let dest_schema = if dest_exists {
        dest.table_schema(dest_table)?
    } else {
        mapping.dest_schema(dest_table, &source_schema)
    };

    // Mapping problems must surface before the destination is touched.
    mapping.validate_against(&spec.name, &source_schema, &dest_schema)?;
    let projection = mapping.projector(&spec.name, &source_schema)?;

    if !dest_exists {
        dest.ensure_table(&dest_schema)?;
    }

    dest.truncate(dest_table).map_err(|e| {
        SpreadError::replicate(
            &spec.name,
            format!(
                "truncate of '{}' on tier '{}' failed, copy aborted: {}",
                dest_table, dest_tier, e
            ),
        )
    })?;

    debug!(
        "copying {}.{} -> {}.{} in chunks of {}",
        source_tier, source_table, dest_tier, dest_table, chunk_size
    );

    let dest_fields = mapping.dest_field_names();
    let mut offset = 0u64;
    let mut rows_copied = 0u64;
    loop {
        let batch = source
            .read_rows(source_table, offset, chunk_size as u64)
            .map_err(|e| {
                SpreadError::replicate(
                    &spec.name,
                    format!(
                        "read from '{}' at offset {} failed: {}",
                        source_table, offset, e
                    ),
                )
            })?;
        if batch.is_empty() {
            break;
        }

        let projected: Vec<Row> = batch.iter().map(|row| projection.apply(row)).collect();
        rows_copied += dest
            .append(dest_table, &dest_fields, &projected)
            .map_err(|e| {
                SpreadError::replicate(
                    &spec.name,
                    format!("append to '{}' on tier '{}' failed: {}", dest_table, dest_tier, e),
                )
            })?;

        let short_read = batch.len() < chunk_size;
        offset += batch.len() as u64;
        if short_read {
            break;
        }
    }

    let dest_rows = dest.row_count(dest_table)?;
    if dest_rows != rows_copied {
        warn!(
            "dataset '{}': destination '{}' holds {} rows after copying {}",
            spec.name, dest_table, dest_rows, rows_copied
        );
    }

    Ok(ReplicationOutcome {
        rows_copied,
        dest_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mapping::FieldMapEntry;
    use crate::core::schema::{FieldDef, FieldType, TableSchema};
    use crate::core::value::FieldValue;
    use crate::store::MemoryStore;
    use std::collections::BTreeMap;

    fn trails_spec() -> DatasetSpec {
        DatasetSpec {
            name: "trails".to_string(),
            table: "trails".to_string(),
            table_overrides: BTreeMap::from([(
                "source".to_string(),
                "TRAILS_EXPORT".to_string(),
            )]),
            fields: vec![
                FieldMapEntry::new("NAME", "name", FieldType::Text),
                FieldMapEntry::new("MILES", "length_miles", FieldType::Real),
            ],
        }
    }

    fn seeded_source(rows: usize) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .ensure_table(&TableSchema::new(
                "TRAILS_EXPORT",
                vec![
                    FieldDef::new("OBJECTID", FieldType::Int),
                    FieldDef::new("NAME", FieldType::Text),
                    FieldDef::new("MILES", FieldType::Real),
                ],
            ))
            .unwrap();
        for i in 0..rows {
            store
                .append(
                    "TRAILS_EXPORT",
                    &[
                        "OBJECTID".to_string(),
                        "NAME".to_string(),
                        "MILES".to_string(),
                    ],
                    &[vec![
                        FieldValue::Int(i as i64),
                        FieldValue::from(format!("Trail {}", i)),
                        FieldValue::from(i as f64 / 2.0),
                    ]],
                )
                .unwrap();
        }
        store
    }

    #[test]
    fn test_copy_creates_destination_and_projects_fields() {
        let source = seeded_source(3);
        let dest = MemoryStore::new();

        let outcome = replicate(&dest, &source, &trails_spec(), "source", "public", 100).unwrap();

        assert_eq!(outcome.rows_copied, 3);
        assert_eq!(outcome.dest_rows, 3);
        let schema = dest.table_schema("trails").unwrap();
        assert_eq!(schema.field_names(), vec!["name", "length_miles"]);
        let rows = dest.read_rows("trails", 0, 10).unwrap();
        assert_eq!(rows[0][0], FieldValue::from("Trail 0"));
    }

    #[test]
    fn test_full_refresh_replaces_previous_rows() {
        let source = seeded_source(2);
        let dest = MemoryStore::new();

        replicate(&dest, &source, &trails_spec(), "source", "public", 100).unwrap();
        let outcome = replicate(&dest, &source, &trails_spec(), "source", "public", 100).unwrap();

        assert_eq!(outcome.rows_copied, 2);
        assert_eq!(outcome.dest_rows, 2);
    }

    #[test]
    fn test_chunked_copy_crosses_boundaries() {
        let source = seeded_source(5);
        let dest = MemoryStore::new();

        let outcome = replicate(&dest, &source, &trails_spec(), "source", "public", 2).unwrap();

        assert_eq!(outcome.rows_copied, 5);
        let rows = dest.read_rows("trails", 0, 10).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4][0], FieldValue::from("Trail 4"));
    }

    #[test]
    fn test_empty_source_empties_destination() {
        let source = seeded_source(2);
        let dest = MemoryStore::new();
        replicate(&dest, &source, &trails_spec(), "source", "public", 100).unwrap();

        source.truncate("TRAILS_EXPORT").unwrap();
        let outcome = replicate(&dest, &source, &trails_spec(), "source", "public", 100).unwrap();

        assert_eq!(outcome.rows_copied, 0);
        assert_eq!(outcome.dest_rows, 0);
    }

    #[test]
    fn test_missing_source_field_fails_before_truncate() {
        let source = MemoryStore::new();
        source
            .ensure_table(&TableSchema::new(
                "TRAILS_EXPORT",
                vec![FieldDef::new("OBJECTID", FieldType::Int)],
            ))
            .unwrap();

        let dest = MemoryStore::new();
        dest.ensure_table(&TableSchema::new(
            "trails",
            vec![
                FieldDef::new("name", FieldType::Text),
                FieldDef::new("length_miles", FieldType::Real),
            ],
        ))
        .unwrap();
        dest.append(
            "trails",
            &["name".to_string(), "length_miles".to_string()],
            &[vec![FieldValue::from("keep me"), FieldValue::Null]],
        )
        .unwrap();

        let err = replicate(&dest, &source, &trails_spec(), "source", "public", 100).unwrap_err();
        assert!(matches!(err, SpreadError::Mapping { .. }));
        // The bad mapping must not have emptied the destination.
        assert_eq!(dest.row_count("trails").unwrap(), 1);
    }

    #[test]
    fn test_missing_dest_field_fails_before_truncate() {
        let source = seeded_source(1);
        let dest = MemoryStore::new();
        dest.ensure_table(&TableSchema::new(
            "trails",
            vec![FieldDef::new("name", FieldType::Text)],
        ))
        .unwrap();
        dest.append(
            "trails",
            &["name".to_string()],
            &[vec![FieldValue::from("keep me")]],
        )
        .unwrap();

        let err = replicate(&dest, &source, &trails_spec(), "source", "public", 100).unwrap_err();
        assert!(matches!(err, SpreadError::Mapping { .. }));
        assert_eq!(dest.row_count("trails").unwrap(), 1);
    }

    /// Store double whose truncate always fails; append must never run.
    struct BrokenTruncate(MemoryStore);

    impl DatasetStore for BrokenTruncate {
        fn table_exists(&self, table: &str) -> Result<bool> {
            self.0.table_exists(table)
        }
        fn table_schema(&self, table: &str) -> Result<TableSchema> {
            self.0.table_schema(table)
        }
        fn ensure_table(&self, schema: &TableSchema) -> Result<()> {
            self.0.ensure_table(schema)
        }
        fn truncate(&self, _table: &str) -> Result<()> {
            Err(SpreadError::Config("store is read-only tonight".to_string()))
        }
        fn append(&self, _table: &str, _fields: &[String], _rows: &[Row]) -> Result<u64> {
            Err(SpreadError::Config("append after failed truncate".to_string()))
        }
        fn read_rows(&self, table: &str, offset: u64, limit: u64) -> Result<Vec<Row>> {
            self.0.read_rows(table, offset, limit)
        }
        fn row_count(&self, table: &str) -> Result<u64> {
            self.0.row_count(table)
        }
        fn domains(&self) -> Result<Vec<crate::catalog::AttributeDomain>> {
            self.0.domains()
        }
        fn relationship_classes(&self) -> Result<Vec<crate::catalog::RelationshipClass>> {
            self.0.relationship_classes()
        }
        fn domain_usage(&self) -> Result<Vec<crate::catalog::DomainUsage>> {
            self.0.domain_usage()
        }
        fn compact(&self) -> Result<()> {
            self.0.compact()
        }
    }

    #[test]
    fn test_failed_truncate_aborts_before_copy() {
        let source = seeded_source(3);
        let dest = BrokenTruncate(MemoryStore::new());
        dest.0
            .ensure_table(&TableSchema::new(
                "trails",
                vec![
                    FieldDef::new("name", FieldType::Text),
                    FieldDef::new("length_miles", FieldType::Real),
                ],
            ))
            .unwrap();
        dest.0
            .append(
                "trails",
                &["name".to_string(), "length_miles".to_string()],
                &[vec![FieldValue::from("stale but intact"), FieldValue::Null]],
            )
            .unwrap();

        let err = replicate(&dest, &source, &trails_spec(), "source", "public", 100).unwrap_err();
        match err {
            SpreadError::Replicate { dataset, message } => {
                assert_eq!(dataset, "trails");
                assert!(message.contains("copy aborted"));
            }
            other => panic!("expected replicate error, got {:?}", other),
        }
        // Nothing was copied and the previous load is still there.
        assert_eq!(dest.0.row_count("trails").unwrap(), 1);
    }

    #[test]
    fn test_missing_source_table_is_config_error() {
        let source = MemoryStore::new();
        let dest = MemoryStore::new();

        let err = replicate(&dest, &source, &trails_spec(), "source", "public", 100).unwrap_err();
        // A bad dataset definition exits like any other config problem.
        assert_eq!(err.exit_code(), 1);
        match err {
            SpreadError::Config(message) => {
                assert!(message.contains("TRAILS_EXPORT"));
                assert!(message.contains("tier 'source'"));
            }
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_chunk_size_still_copies() {
        let source = seeded_source(3);
        let dest = MemoryStore::new();

        let outcome = replicate(&dest, &source, &trails_spec(), "source", "public", 0).unwrap();

        assert_eq!(outcome.rows_copied, 3);
        assert_eq!(outcome.dest_rows, 3);
    }

    #[test]
    fn test_extra_destination_fields_are_ignored() {
        let source = seeded_source(1);
        let dest = MemoryStore::new();
        dest.ensure_table(&TableSchema::new(
            "trails",
            vec![
                FieldDef::new("name", FieldType::Text),
                FieldDef::new("length_miles", FieldType::Real),
                FieldDef::new("loaded_by", FieldType::Text),
            ],
        ))
        .unwrap();

        let outcome = replicate(&dest, &source, &trails_spec(), "source", "public", 100).unwrap();

        assert_eq!(outcome.rows_copied, 1);
        let rows = dest.read_rows("trails", 0, 10).unwrap();
        // Unmapped housekeeping column stays null.
        assert_eq!(rows[0][2], FieldValue::Null);
    }
}
