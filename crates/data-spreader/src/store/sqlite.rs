//! File-backed sqlite staging store.
//!
//! Each sqlite tier is one database file. The connection is configured for
//! WAL journaling with a busy timeout and guarded by a mutex so the store
//! can hand out `&self` operations.
//!
//! Geodatabase catalog inventories read from three side tables when present
//! (`gdb_domains`, `gdb_relationship_classes`, `gdb_field_domains`); export
//! tooling writes them alongside the data tables, and a store without them
//! simply reports empty inventories.

use crate::catalog::{AttributeDomain, DomainUsage, RelationshipClass};
use crate::core::schema::{FieldDef, FieldType, TableSchema};
use crate::core::value::{FieldValue, Row};
use crate::error::{Result, SpreadError};
use crate::store::{acquire_lock, DatasetStore};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

const DOMAINS_TABLE: &str = "gdb_domains";
const RELATIONSHIPS_TABLE: &str = "gdb_relationship_classes";
const FIELD_DOMAINS_TABLE: &str = "gdb_field_domains";

/// Quote an identifier for sqlite SQL.
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// File-backed staging store.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        configure_connection(&conn);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure_connection(&conn);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn exists_inner(conn: &Connection, table: &str) -> Result<bool> {
        let mut stmt = conn.prepare(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
        )?;
        Ok(stmt.exists([table])?)
    }

    fn schema_inner(conn: &Connection, table: &str) -> Result<TableSchema> {
        let mut stmt =
            conn.prepare("SELECT name, type, \"notnull\" FROM pragma_table_info(?1)")?;
        let fields = stmt
            .query_map([table], |row| {
                let name: String = row.get(0)?;
                let decl: String = row.get(1)?;
                let notnull: i64 = row.get(2)?;
                Ok(FieldDef {
                    name,
                    field_type: FieldType::from_decl(&decl),
                    nullable: notnull == 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if fields.is_empty() {
            return Err(SpreadError::Config(format!(
                "table '{}' does not exist",
                table
            )));
        }
        Ok(TableSchema::new(table, fields))
    }
}

/// Apply the store's connection pragmas.
///
/// WAL journaling with NORMAL synchronous and a 5 second busy timeout; the
/// pragma results are ignored because journal_mode answers with a string.
fn configure_connection(conn: &Connection) {
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", "5000");
}

fn value_to_sql(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(v) => Value::Integer(i64::from(*v)),
        FieldValue::Int(v) => Value::Integer(*v),
        FieldValue::Real(v) => Value::Real(*v),
        FieldValue::Text(v) => Value::Text(v.clone()),
        FieldValue::Blob(v) => Value::Blob(v.clone()),
        FieldValue::Date(v) => Value::Text(v.format("%Y-%m-%d").to_string()),
        FieldValue::Timestamp(v) => Value::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        FieldValue::Guid(v) => Value::Text(v.to_string()),
    }
}

/// Convert a raw sqlite value using the column's declared type.
///
/// Dates, timestamps and guids are stored as TEXT; the declared type brings
/// them back as typed values. Text that fails to parse stays text rather
/// than failing the read, matching the no-schema-test tolerance of the rest
/// of the pipeline.
fn value_from_column(value: ValueRef<'_>, field_type: FieldType) -> FieldValue {
    match value {
        ValueRef::Null => FieldValue::Null,
        ValueRef::Integer(i) => {
            if field_type == FieldType::Bool {
                FieldValue::Bool(i != 0)
            } else {
                FieldValue::Int(i)
            }
        }
        ValueRef::Real(r) => FieldValue::Real(r),
        ValueRef::Blob(b) => FieldValue::Blob(b.to_vec()),
        ValueRef::Text(t) => {
            let text = String::from_utf8_lossy(t).into_owned();
            match field_type {
                FieldType::Date => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                    .map(FieldValue::Date)
                    .unwrap_or(FieldValue::Text(text)),
                FieldType::Timestamp => {
                    NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f")
                        .map(FieldValue::Timestamp)
                        .unwrap_or(FieldValue::Text(text))
                }
                FieldType::Guid => Uuid::parse_str(&text)
                    .map(FieldValue::Guid)
                    .unwrap_or(FieldValue::Text(text)),
                _ => FieldValue::Text(text),
            }
        }
    }
}

impl DatasetStore for SqliteStore {
    fn table_exists(&self, table: &str) -> Result<bool> {
        let conn = acquire_lock(&self.conn);
        Self::exists_inner(&conn, table)
    }

    fn table_schema(&self, table: &str) -> Result<TableSchema> {
        let conn = acquire_lock(&self.conn);
        Self::schema_inner(&conn, table)
    }

    fn ensure_table(&self, schema: &TableSchema) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        if Self::exists_inner(&conn, &schema.name)? {
            return Ok(());
        }

        let columns: Vec<String> = schema
            .fields
            .iter()
            .map(|f| {
                let mut col = format!("{} {}", quote_ident(&f.name), f.field_type.sqlite_decl());
                if !f.nullable {
                    col.push_str(" NOT NULL");
                }
                col
            })
            .collect();

        let sql = format!(
            "CREATE TABLE {} ({})",
            quote_ident(&schema.name),
            columns.join(", ")
        );
        tracing::debug!("creating table {}", schema.name);
        conn.execute(&sql, [])?;
        Ok(())
    }

    fn truncate(&self, table: &str) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        // sqlite has no TRUNCATE; an unqualified DELETE takes the fast path.
        conn.execute(&format!("DELETE FROM {}", quote_ident(table)), [])?;
        Ok(())
    }

    fn append(&self, table: &str, fields: &[String], rows: &[Row]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = acquire_lock(&self.conn);
        let column_list: Vec<String> = fields.iter().map(|f| quote_ident(f)).collect();
        let placeholders: Vec<String> = (1..=fields.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            column_list.join(", "),
            placeholders.join(", ")
        );

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                if row.len() != fields.len() {
                    return Err(SpreadError::Config(format!(
                        "row width {} does not match field list {} for table '{}'",
                        row.len(),
                        fields.len(),
                        table
                    )));
                }
                stmt.execute(rusqlite::params_from_iter(row.iter().map(value_to_sql)))?;
            }
        }
        tx.commit()?;
        Ok(rows.len() as u64)
    }

    fn read_rows(&self, table: &str, offset: u64, limit: u64) -> Result<Vec<Row>> {
        let conn = acquire_lock(&self.conn);
        let schema = Self::schema_inner(&conn, table)?;

        let column_list: Vec<String> = schema
            .fields
            .iter()
            .map(|f| quote_ident(&f.name))
            .collect();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid LIMIT ?1 OFFSET ?2",
            column_list.join(", "),
            quote_ident(table)
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([limit as i64, offset as i64], |row| {
                let mut values = Vec::with_capacity(schema.fields.len());
                for (i, field) in schema.fields.iter().enumerate() {
                    values.push(value_from_column(row.get_ref(i)?, field.field_type));
                }
                Ok(values)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn row_count(&self, table: &str) -> Result<u64> {
        let conn = acquire_lock(&self.conn);
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn domains(&self) -> Result<Vec<AttributeDomain>> {
        let conn = acquire_lock(&self.conn);
        if !Self::exists_inner(&conn, DOMAINS_TABLE)? {
            return Ok(Vec::new());
        }
        let mut stmt = conn.prepare(
            "SELECT name, field_type, domain_type, description FROM gdb_domains ORDER BY name",
        )?;
        let domains = stmt
            .query_map([], |row| {
                Ok(AttributeDomain {
                    name: row.get(0)?,
                    field_type: row.get(1)?,
                    domain_type: row.get(2)?,
                    description: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(domains)
    }

    fn relationship_classes(&self) -> Result<Vec<RelationshipClass>> {
        let conn = acquire_lock(&self.conn);
        if !Self::exists_inner(&conn, RELATIONSHIPS_TABLE)? {
            return Ok(Vec::new());
        }
        let mut stmt = conn.prepare(
            "SELECT name, origin, destination, cardinality, is_attributed, \
             forward_label, backward_label \
             FROM gdb_relationship_classes ORDER BY name",
        )?;
        let classes = stmt
            .query_map([], |row| {
                Ok(RelationshipClass {
                    name: row.get(0)?,
                    origin: row.get(1)?,
                    destination: row.get(2)?,
                    cardinality: row.get(3)?,
                    is_attributed: row.get::<_, i64>(4)? != 0,
                    forward_label: row.get(5)?,
                    backward_label: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(classes)
    }

    fn domain_usage(&self) -> Result<Vec<DomainUsage>> {
        let conn = acquire_lock(&self.conn);
        if !Self::exists_inner(&conn, FIELD_DOMAINS_TABLE)? {
            return Ok(Vec::new());
        }
        let mut stmt = conn.prepare(
            "SELECT dataset, field, domain FROM gdb_field_domains ORDER BY dataset, field",
        )?;
        let usage = stmt
            .query_map([], |row| {
                Ok(DomainUsage {
                    dataset: row.get(0)?,
                    field: row.get(1)?,
                    domain: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(usage)
    }

    fn compact(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.execute_batch("VACUUM")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn trail_schema() -> TableSchema {
        TableSchema::new(
            "trails",
            vec![
                FieldDef::required("name", FieldType::Text),
                FieldDef::new("length_miles", FieldType::Real),
                FieldDef::new("surveyed", FieldType::Date),
                FieldDef::new("edited_at", FieldType::Timestamp),
                FieldDef::new("global_id", FieldType::Guid),
                FieldDef::new("is_paved", FieldType::Bool),
            ],
        )
    }

    fn sample_row() -> Row {
        vec![
            FieldValue::from("Ridge Loop"),
            FieldValue::from(3.25),
            FieldValue::Date(NaiveDate::from_ymd_opt(2023, 10, 2).unwrap()),
            FieldValue::Timestamp(
                NaiveDateTime::parse_from_str("2024-01-05 08:30:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            ),
            FieldValue::Guid(Uuid::nil()),
            FieldValue::Bool(true),
        ]
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("trails"), "\"trails\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn test_round_trip_typed_values() {
        let store = SqliteStore::open_in_memory().unwrap();
        let schema = trail_schema();
        store.ensure_table(&schema).unwrap();

        let fields = schema.field_names();
        let row = sample_row();
        store.append("trails", &fields, &[row.clone()]).unwrap();

        let read = store.read_rows("trails", 0, 10).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0], row);
    }

    #[test]
    fn test_schema_read_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_table(&trail_schema()).unwrap();

        let schema = store.table_schema("trails").unwrap();
        assert_eq!(schema.fields.len(), 6);
        assert_eq!(schema.fields[0].field_type, FieldType::Text);
        assert!(!schema.fields[0].nullable);
        assert_eq!(schema.fields[2].field_type, FieldType::Date);
        assert_eq!(schema.fields[4].field_type, FieldType::Guid);
        assert_eq!(schema.fields[5].field_type, FieldType::Bool);
    }

    #[test]
    fn test_table_exists_case_insensitive() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_table(&trail_schema()).unwrap();
        assert!(store.table_exists("TRAILS").unwrap());
        assert!(!store.table_exists("roads").unwrap());
    }

    #[test]
    fn test_truncate_missing_table_errors() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.truncate("ghost").unwrap_err();
        assert!(matches!(err, SpreadError::Store(_)));
    }

    #[test]
    fn test_truncate_then_count() {
        let store = SqliteStore::open_in_memory().unwrap();
        let schema = trail_schema();
        store.ensure_table(&schema).unwrap();
        store
            .append("trails", &schema.field_names(), &[sample_row()])
            .unwrap();
        assert_eq!(store.row_count("trails").unwrap(), 1);
        store.truncate("trails").unwrap();
        assert_eq!(store.row_count("trails").unwrap(), 0);
    }

    #[test]
    fn test_read_rows_deterministic_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let schema = TableSchema::new("t", vec![FieldDef::new("n", FieldType::Int)]);
        store.ensure_table(&schema).unwrap();
        let fields = schema.field_names();
        for i in 0..10i64 {
            store
                .append("t", &fields, &[vec![FieldValue::Int(i)]])
                .unwrap();
        }
        let first = store.read_rows("t", 0, 4).unwrap();
        let second = store.read_rows("t", 4, 4).unwrap();
        assert_eq!(first[0][0], FieldValue::Int(0));
        assert_eq!(second[0][0], FieldValue::Int(4));
    }

    #[test]
    fn test_catalog_side_tables() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.domains().unwrap().is_empty());

        let domains_schema = TableSchema::new(
            DOMAINS_TABLE,
            vec![
                FieldDef::new("name", FieldType::Text),
                FieldDef::new("field_type", FieldType::Text),
                FieldDef::new("domain_type", FieldType::Text),
                FieldDef::new("description", FieldType::Text),
            ],
        );
        store.ensure_table(&domains_schema).unwrap();
        store
            .append(
                DOMAINS_TABLE,
                &domains_schema.field_names(),
                &[vec![
                    FieldValue::from("RoadSurface"),
                    FieldValue::from("text"),
                    FieldValue::from("coded_value"),
                    FieldValue::Null,
                ]],
            )
            .unwrap();

        let domains = store.domains().unwrap();
        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].name, "RoadSurface");
        assert_eq!(domains[0].description, None);
    }

    #[test]
    fn test_compact_runs() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("tier.sqlite")).unwrap();
        store.ensure_table(&trail_schema()).unwrap();
        store.compact().unwrap();
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("staging/deep/tier.sqlite");
        let store = SqliteStore::open(&nested).unwrap();
        store.ensure_table(&trail_schema()).unwrap();
        assert!(nested.exists());
    }
}
