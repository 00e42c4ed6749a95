//! Field value types for store-agnostic row handling.
//!
//! Rows move between staging stores as vectors of [`FieldValue`]. Values are
//! owned: replication is strictly sequential and batch sizes are bounded, so
//! copies stay cheap and the types stay simple.

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

/// A single field value read from or written to a staging store.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// NULL / absent value.
    Null,

    /// Boolean value.
    Bool(bool),

    /// 64-bit signed integer (covers int, bigint, object IDs).
    Int(i64),

    /// 64-bit floating point (coordinates, areas, lengths).
    Real(f64),

    /// Text data.
    Text(String),

    /// Binary data (geometry blobs, attachments).
    Blob(Vec<u8>),

    /// Date without time component.
    Date(NaiveDate),

    /// Timestamp without timezone (edit tracking fields).
    Timestamp(NaiveDateTime),

    /// GUID value (GlobalID fields).
    Guid(Uuid),
}

impl FieldValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Short type name for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Real(_) => "real",
            FieldValue::Text(_) => "text",
            FieldValue::Blob(_) => "blob",
            FieldValue::Date(_) => "date",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Guid(_) => "guid",
        }
    }

    /// Render the value as display text (log lines, report cells).
    ///
    /// Dates use ISO-8601; the same renderings are used for TEXT storage in
    /// the sqlite store, so displayed values round-trip.
    #[must_use]
    pub fn display_string(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(v) => v.to_string(),
            FieldValue::Int(v) => v.to_string(),
            FieldValue::Real(v) => v.to_string(),
            FieldValue::Text(v) => v.clone(),
            FieldValue::Blob(v) => format!("<{} bytes>", v.len()),
            FieldValue::Date(v) => v.format("%Y-%m-%d").to_string(),
            FieldValue::Timestamp(v) => v.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            FieldValue::Guid(v) => v.to_string(),
        }
    }
}

/// One row of field values, ordered by the table schema.
pub type Row = Vec<FieldValue>;

// From implementations for common types
impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Real(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Blob(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(v: NaiveDateTime) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl From<Uuid> for FieldValue {
    fn from(v: Uuid) -> Self {
        FieldValue::Guid(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => FieldValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null() {
        assert!(FieldValue::Null.is_null());
        assert!(!FieldValue::Int(42).is_null());
    }

    #[test]
    fn test_from_implementations() {
        let v: FieldValue = 42i32.into();
        assert_eq!(v, FieldValue::Int(42));

        let v: FieldValue = "hello".into();
        assert_eq!(v, FieldValue::Text("hello".to_string()));

        let v: FieldValue = Option::<i64>::None.into();
        assert_eq!(v, FieldValue::Null);

        let v: FieldValue = Some("x".to_string()).into();
        assert_eq!(v, FieldValue::Text("x".to_string()));
    }

    #[test]
    fn test_display_string() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(FieldValue::Date(d).display_string(), "2024-03-05");
        assert_eq!(FieldValue::Null.display_string(), "");
        assert_eq!(FieldValue::Blob(vec![1, 2, 3]).display_string(), "<3 bytes>");
    }
}
