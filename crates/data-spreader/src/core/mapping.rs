//! Field mappings between an upstream table and its downstream copy.
//!
//! A mapping is the ordered list of `from -> to` field pairs a dataset is
//! replicated through. Fields not named by the mapping are ignored on both
//! sides, so tiers may carry extra housekeeping columns without breaking a
//! copy. A mapping that names a field missing from either real schema is a
//! configuration mistake and is rejected before any data moves.
//!
//! Each mapped field is read from the source under its `from` name, falling
//! back to its `to` name when the source already carries destination naming.
//! The fallback is what lets one mapping drive a whole chained route: the
//! rename happens on the first hop, and every downstream hop copies fields
//! that already answer to their `to` names.

use crate::core::schema::{FieldDef, FieldType, TableSchema};
use crate::core::value::{FieldValue, Row};
use crate::error::{Result, SpreadError};
use serde::{Deserialize, Serialize};

/// One `from -> to` pair of a field mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapEntry {
    /// Field name in the source table.
    pub from: String,

    /// Field name in the destination table.
    pub to: String,

    /// Declared type, used when the destination table must be created.
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
}

impl FieldMapEntry {
    /// Create an entry with an explicit type.
    pub fn new(from: impl Into<String>, to: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            field_type,
        }
    }

    /// Create a same-name entry.
    pub fn same(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            from: name.clone(),
            to: name,
            field_type,
        }
    }
}

/// Ordered field mapping for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMap {
    entries: Vec<FieldMapEntry>,
}

impl FieldMap {
    /// Create a mapping from its entries.
    #[must_use]
    pub fn new(entries: Vec<FieldMapEntry>) -> Self {
        Self { entries }
    }

    /// Derive a same-name mapping covering every field of a schema.
    #[must_use]
    pub fn identity(schema: &TableSchema) -> Self {
        Self {
            entries: schema
                .fields
                .iter()
                .map(|f| FieldMapEntry::same(&f.name, f.field_type))
                .collect(),
        }
    }

    /// The mapping entries in order.
    #[must_use]
    pub fn entries(&self) -> &[FieldMapEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destination field names in mapping order.
    #[must_use]
    pub fn dest_field_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.to.clone()).collect()
    }

    /// Check every entry against both real schemas. The source must carry
    /// the field under its `from` or `to` name; the destination must carry
    /// it under `to`. A miss on either side is a configuration error,
    /// reported before any destination row is touched.
    pub fn validate_against(
        &self,
        dataset: &str,
        source: &TableSchema,
        dest: &TableSchema,
    ) -> Result<()> {
        for entry in &self.entries {
            if source_index(source, entry).is_none() {
                return Err(SpreadError::mapping(
                    dataset,
                    missing_source_field(source, entry),
                ));
            }
            if !dest.has_field(&entry.to) {
                return Err(SpreadError::mapping(
                    dataset,
                    format!(
                        "destination table {} has no field '{}'",
                        dest.name, entry.to
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Build a row projector bound to a concrete source schema.
    ///
    /// Column indices are resolved once; [`Projection::apply`] then selects
    /// and reorders values for every row of the copy.
    pub fn projector(&self, dataset: &str, source: &TableSchema) -> Result<Projection> {
        let mut indices = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let idx = source_index(source, entry).ok_or_else(|| {
                SpreadError::mapping(dataset, missing_source_field(source, entry))
            })?;
            indices.push(idx);
        }
        Ok(Projection { indices })
    }

    /// Schema the destination table gets when it must be created.
    ///
    /// Nullability follows the source field where one matches; a renamed
    /// field with no source counterpart is created nullable.
    #[must_use]
    pub fn dest_schema(&self, table: &str, source: &TableSchema) -> TableSchema {
        let fields = self
            .entries
            .iter()
            .map(|e| {
                let matched = source_index(source, e).map(|i| &source.fields[i]);
                FieldDef {
                    name: e.to.clone(),
                    field_type: e.field_type,
                    nullable: matched.map(|f| f.nullable).unwrap_or(true),
                }
            })
            .collect();
        TableSchema::new(table, fields)
    }
}

/// Source column for one entry, preferring `from` over the `to` fallback.
fn source_index(source: &TableSchema, entry: &FieldMapEntry) -> Option<usize> {
    source
        .field_index(&entry.from)
        .or_else(|| source.field_index(&entry.to))
}

fn missing_source_field(source: &TableSchema, entry: &FieldMapEntry) -> String {
    if entry.from.eq_ignore_ascii_case(&entry.to) {
        format!("source table {} has no field '{}'", source.name, entry.from)
    } else {
        format!(
            "source table {} has neither field '{}' nor '{}'",
            source.name, entry.from, entry.to
        )
    }
}

/// Row projector produced by [`FieldMap::projector`].
#[derive(Debug, Clone)]
pub struct Projection {
    indices: Vec<usize>,
}

impl Projection {
    /// Select and reorder one source row into destination order.
    ///
    /// A source column beyond the row's length reads as NULL; stores pad
    /// short rows the same way.
    #[must_use]
    pub fn apply(&self, row: &[FieldValue]) -> Row {
        self.indices
            .iter()
            .map(|&i| row.get(i).cloned().unwrap_or(FieldValue::Null))
            .collect()
    }
}
