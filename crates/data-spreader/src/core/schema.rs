//! Schema metadata for staged tables.
//!
//! These types give a store-agnostic view of a table: what fields it has and
//! what they hold. Field lookups are case-insensitive because the upstream
//! extracts carry UPPERCASE field names while downstream tiers use lowercase.

use serde::{Deserialize, Serialize};

/// Declared type of a field, as carried by config mappings and table creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Bool,
    Int,
    Real,
    Text,
    Blob,
    Date,
    Timestamp,
    Guid,
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::Text
    }
}

impl FieldType {
    /// Declared column type used when creating sqlite tables.
    ///
    /// Date, timestamp and guid columns are stored as TEXT but keep a
    /// distinct declared type so schemas read back with the right kind.
    #[must_use]
    pub fn sqlite_decl(&self) -> &'static str {
        match self {
            FieldType::Bool => "BOOLEAN",
            FieldType::Int => "INTEGER",
            FieldType::Real => "REAL",
            FieldType::Text => "TEXT",
            FieldType::Blob => "BLOB",
            FieldType::Date => "DATE",
            FieldType::Timestamp => "TIMESTAMP",
            FieldType::Guid => "GUID",
        }
    }

    /// Map a declared column type back to a field type.
    ///
    /// Unrecognized declarations fall back to [`FieldType::Text`]; staging
    /// files come from several generations of export tooling and carry
    /// whatever type names those tools liked.
    #[must_use]
    pub fn from_decl(decl: &str) -> FieldType {
        let decl = decl.trim().to_ascii_uppercase();
        let base = decl.split('(').next().unwrap_or("").trim();
        match base {
            "BOOL" | "BOOLEAN" => FieldType::Bool,
            "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" | "MEDIUMINT" => FieldType::Int,
            "REAL" | "FLOAT" | "DOUBLE" | "DOUBLE PRECISION" | "NUMERIC" | "DECIMAL" => {
                FieldType::Real
            }
            "BLOB" => FieldType::Blob,
            "DATE" => FieldType::Date,
            "TIMESTAMP" | "DATETIME" | "DATETIME2" => FieldType::Timestamp,
            "GUID" | "UUID" | "UNIQUEIDENTIFIER" => FieldType::Guid,
            _ => FieldType::Text,
        }
    }
}

/// Field metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,

    /// Declared type.
    pub field_type: FieldType,

    /// Whether the field allows NULL.
    pub nullable: bool,
}

impl FieldDef {
    /// Create a nullable field definition.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: true,
        }
    }

    /// Create a NOT NULL field definition.
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
        }
    }
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,

    /// Field definitions in column order.
    pub fields: Vec<FieldDef>,
}

impl TableSchema {
    /// Create a schema from a name and field list.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Look up a field by name, case-insensitively.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Column index of a field, case-insensitively.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Check whether a field exists.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Field names in column order.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parcel_schema() -> TableSchema {
        TableSchema::new(
            "parcels",
            vec![
                FieldDef::required("PIN", FieldType::Text),
                FieldDef::new("SITE_ADDR", FieldType::Text),
                FieldDef::new("acreage", FieldType::Real),
            ],
        )
    }

    #[test]
    fn test_field_lookup_case_insensitive() {
        let schema = parcel_schema();
        assert!(schema.has_field("pin"));
        assert!(schema.has_field("Site_Addr"));
        assert!(!schema.has_field("owner"));
        assert_eq!(schema.field_index("ACREAGE"), Some(2));
    }

    #[test]
    fn test_from_decl() {
        assert_eq!(FieldType::from_decl("INTEGER"), FieldType::Int);
        assert_eq!(FieldType::from_decl("bigint"), FieldType::Int);
        assert_eq!(FieldType::from_decl("VARCHAR(50)"), FieldType::Text);
        assert_eq!(FieldType::from_decl("double precision"), FieldType::Real);
        assert_eq!(FieldType::from_decl("DATETIME"), FieldType::Timestamp);
        assert_eq!(FieldType::from_decl("uniqueidentifier"), FieldType::Guid);
        assert_eq!(FieldType::from_decl("geometry"), FieldType::Text);
    }

    #[test]
    fn test_decl_round_trip() {
        for ft in [
            FieldType::Bool,
            FieldType::Int,
            FieldType::Real,
            FieldType::Text,
            FieldType::Blob,
            FieldType::Date,
            FieldType::Timestamp,
            FieldType::Guid,
        ] {
            assert_eq!(FieldType::from_decl(ft.sqlite_decl()), ft);
        }
    }
}
