//! Error types for data loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Data file not found.
    #[error("data file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// File extension is not one of the supported formats.
    #[error("unsupported file extension '{extension}' for {path} (expected .csv, .tsv, .txt or .xpt)")]
    UnsupportedExtension { path: PathBuf, extension: String },

    /// Failed to parse delimited text with Polars.
    #[error("failed to parse {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// File content does not follow the expected layout.
    #[error("malformed file {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// File parsed but has no rows.
    #[error("dataset is empty: {path}")]
    EmptyDataset { path: PathBuf },

    /// Column not found in DataFrame.
    #[error("column '{column}' not found in DataFrame")]
    ColumnNotFound { column: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl IngestError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
