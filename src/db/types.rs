//! Query result types
//!
//! The result envelope for caller-supplied SQL and the opaque typed cell
//! values materialized from driver rows.

use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Result envelope for one executed statement.
///
/// Either `error` is set and `rows` is empty, or `columns` is populated
/// (possibly empty for non-row-producing statements) and `message`
/// summarizes the outcome. Pagination fields describe the single page the
/// core returns.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
}

/// A single cell value materialized from a driver row.
///
/// Cells preserve their natural kind through the core; the caller formats
/// them for transport. Serialization maps each kind onto its natural JSON
/// form (bytea renders in PostgreSQL's `\x` hex notation).
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// NULL value
    Null,

    /// Integer value
    Integer(i64),

    /// Floating point value
    Float(f64),

    /// Text/string value
    Text(String),

    /// Boolean value
    Boolean(bool),

    /// JSON value (parsed)
    Json(serde_json::Value),

    /// Binary data
    Binary(Vec<u8>),

    /// Date/time value (rendered as text)
    DateTime(String),

    /// UUID value
    Uuid(String),

    /// Array value
    Array(Vec<CellValue>),
}

impl CellValue {
    /// Check if this is a NULL value
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            CellValue::Null => serializer.serialize_unit(),
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            CellValue::Float(f) => serializer.serialize_f64(*f),
            CellValue::Text(s) | CellValue::DateTime(s) | CellValue::Uuid(s) => {
                serializer.serialize_str(s)
            }
            CellValue::Boolean(b) => serializer.serialize_bool(*b),
            CellValue::Json(v) => v.serialize(serializer),
            CellValue::Binary(b) => serializer.serialize_str(&format!("\\x{}", hex::encode(b))),
            CellValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}
