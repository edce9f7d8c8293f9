//! Error types for sqldesk
//!
//! This module defines the error hierarchy used throughout the crate.
//! We use `thiserror` for library-style errors with clear error chains.

use std::fmt;

/// The introspection stage at which a schema query failed.
///
/// Schema introspection runs several catalog queries per table; when one of
/// them fails the whole operation fails, tagged with the stage so callers
/// can tell which query misbehaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStage {
    Tables,
    Columns,
    Indexes,
    KeyConstraints,
    ForeignKeyDetails,
    CheckConstraints,
}

impl fmt::Display for SchemaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemaStage::Tables => "tables",
            SchemaStage::Columns => "columns",
            SchemaStage::Indexes => "indexes",
            SchemaStage::KeyConstraints => "key-constraints",
            SchemaStage::ForeignKeyDetails => "fk-details",
            SchemaStage::CheckConstraints => "check",
        };
        f.write_str(name)
    }
}

/// The phase at which executing caller-supplied SQL failed.
///
/// tokio-postgres reports column metadata at prepare time and folds
/// iteration errors into the row stream, so the phases are: the initial
/// statement (`Query`), row materialization (`Scan`), the post-row commit
/// path (`Iteration`), and the non-row-producing fallback (`Exec`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecPhase {
    Query,
    Scan,
    Iteration,
    Exec,
}

impl fmt::Display for ExecPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecPhase::Query => "query",
            ExecPhase::Scan => "scan",
            ExecPhase::Iteration => "iteration",
            ExecPhase::Exec => "exec",
        };
        f.write_str(name)
    }
}

/// Main error type for resource-editor operations
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// Failed to establish the backend connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// No database connection could be acquired
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// An introspection query failed; no partial schema is returned
    #[error("Schema query failed at stage '{stage}': {message}")]
    SchemaQueryFailed { stage: SchemaStage, message: String },

    /// Caller-supplied SQL failed at a specific phase
    #[error("Query execution failed during '{phase}': {message}")]
    ExecutionFailed { phase: ExecPhase, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EditorError {
    /// Build a `SchemaQueryFailed` from a driver error at the given stage.
    pub(crate) fn schema(stage: SchemaStage, err: tokio_postgres::Error) -> Self {
        EditorError::SchemaQueryFailed {
            stage,
            message: err.to_string(),
        }
    }

    /// Build an `ExecutionFailed` from a driver error at the given phase.
    pub(crate) fn execution(phase: ExecPhase, err: tokio_postgres::Error) -> Self {
        EditorError::ExecutionFailed {
            phase,
            message: err.to_string(),
        }
    }
}

/// Configuration parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid connection URL or parameter
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Specialized Result type for resource-editor operations
pub type EditorResult<T> = std::result::Result<T, EditorError>;

/// Specialized Result type for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
