//! Error types for the churn pipeline.
//!
//! Every stage returns `Result<T, ChurnError>`. The binary decides how a
//! failure is surfaced (console message, exit code); the library never
//! swallows an error.

use std::path::PathBuf;

use thiserror::Error;

/// Broad failure classes used to pick troubleshooting hints and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection refused, bad credentials, driver/query failure
    Connectivity,
    /// Table missing or empty, wrong schema, missing labels, too few rows
    Validation,
    /// File missing, permission denied, file held open elsewhere
    Io,
    /// Output failed a post-write sanity check
    Corruption,
}

/// Errors that can occur while extracting, training or predicting.
#[derive(Debug, Error)]
pub enum ChurnError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Database query failed: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Table '{0}' not found in database")]
    TableNotFound(String),

    #[error("Table '{0}' is empty - no data to export")]
    EmptyTable(String),

    #[error("Missing required statuses: {0:?}")]
    MissingStatuses(Vec<String>),

    #[error("Only {found} records - need at least {required} for training")]
    InsufficientRows { found: usize, required: usize },

    #[error("Missing features in data: {0:?}")]
    MissingFeatures(Vec<String>),

    #[error("Feature '{0}' has no non-missing values to compute a median from")]
    EmptyFeature(String),

    #[error("Column '{column}' holds a value that is not a valid {expected}: '{value}'")]
    InvalidValue {
        column: String,
        expected: &'static str,
        value: String,
    },

    #[error("{kind} file missing at {}", path.display())]
    FileMissing { kind: &'static str, path: PathBuf },

    #[error(
        "Exported file is too small ({size} bytes, expected at least {minimum}) - possible export failure"
    )]
    UndersizedOutput { size: u64, minimum: u64 },

    #[error("Unsupported file format: '{0}'. Supported formats: csv, parquet")]
    UnsupportedFormat(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("Model serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Model error: {0}")]
    Model(String),
}

impl ChurnError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ChurnError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ChurnError::Connection(_) | ChurnError::Database(_) => ErrorCategory::Connectivity,
            ChurnError::TableNotFound(_)
            | ChurnError::EmptyTable(_)
            | ChurnError::MissingStatuses(_)
            | ChurnError::InsufficientRows { .. }
            | ChurnError::MissingFeatures(_)
            | ChurnError::EmptyFeature(_)
            | ChurnError::InvalidValue { .. }
            | ChurnError::UnsupportedFormat(_)
            | ChurnError::InvalidConfig(_)
            | ChurnError::Model(_) => ErrorCategory::Validation,
            ChurnError::FileMissing { .. }
            | ChurnError::Io { .. }
            | ChurnError::Polars(_)
            | ChurnError::Serialization(_) => ErrorCategory::Io,
            ChurnError::UndersizedOutput { .. } => ErrorCategory::Corruption,
        }
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, ChurnError>;
