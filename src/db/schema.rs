//! Schema model
//!
//! Value records describing an introspected schema: tables, columns,
//! indexes, and constraints. Produced per-request by
//! [`crate::db::introspect`] and never cached by the core.

use serde::Serialize;
use std::fmt;

/// Full introspection result for one schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaInformation {
    pub schema_name: String,
    /// Tables in ascending name order
    pub tables: Vec<TableDetails>,
}

/// One table with its columns, indexes, and constraints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDetails {
    pub table_name: String,
    /// Ordered by ordinal position
    pub columns: Vec<ColumnDetails>,
    /// Ordered by discovery
    pub indexes: Vec<IndexDetails>,
    /// Ordered by discovery
    pub constraints: Vec<ConstraintDetails>,
}

/// A table column as reported by the information schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDetails {
    pub column_name: String,
    pub ordinal_position: i32,
    pub column_default: Option<String>,
    /// "YES" or "NO", verbatim from the information schema
    pub is_nullable: String,
    pub data_type: String,
    pub character_maximum_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
    pub comment: Option<String>,
}

/// An index with its key columns in key order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDetails {
    pub index_name: String,
    pub index_definition: String,
    pub is_unique: bool,
    pub is_primary: bool,
    /// Access method name; empty when the catalog reports none
    pub index_type: String,
    pub columns: Vec<String>,
}

/// Constraint kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConstraintType {
    #[serde(rename = "PRIMARY KEY")]
    PrimaryKey,
    #[serde(rename = "FOREIGN KEY")]
    ForeignKey,
    #[serde(rename = "UNIQUE")]
    Unique,
    #[serde(rename = "CHECK")]
    Check,
}

impl ConstraintType {
    /// Parse the information-schema spelling of a constraint type.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PRIMARY KEY" => Some(ConstraintType::PrimaryKey),
            "FOREIGN KEY" => Some(ConstraintType::ForeignKey),
            "UNIQUE" => Some(ConstraintType::Unique),
            "CHECK" => Some(ConstraintType::Check),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintType::PrimaryKey => "PRIMARY KEY",
            ConstraintType::ForeignKey => "FOREIGN KEY",
            ConstraintType::Unique => "UNIQUE",
            ConstraintType::Check => "CHECK",
        };
        f.write_str(name)
    }
}

/// A merged constraint view
///
/// Key-type constraints carry `column_names` in ordinal order. FOREIGN KEY
/// additionally carries `foreign_table_name` and `foreign_column_names`
/// aligned positionally with `column_names`. CHECK carries `check_clause`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintDetails {
    pub constraint_name: String,
    pub constraint_type: ConstraintType,
    pub column_names: Vec<String>,
    pub foreign_table_name: Option<String>,
    pub foreign_column_names: Vec<String>,
    pub check_clause: Option<String>,
    pub deferrable: bool,
    pub initially_deferred: bool,
}
