//! Error types shared by the analysis crates.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised by panel preparation and mediation estimation.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Invalid or missing column names, unknown option labels, duplicate
    /// panel index entries, or an invalid option combination.
    #[error("configuration error ({field}): {message}")]
    Configuration { field: String, message: String },

    /// Numerical failure inside a regression fit.
    #[error("estimation failed ({model}): {message}")]
    Estimation { model: String, message: String },

    /// Input file could not be interpreted.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl PanelError {
    /// Create a Configuration error.
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an Estimation error.
    pub fn estimation(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Estimation {
            model: model.into(),
            message: message.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    pub fn is_estimation(&self) -> bool {
        matches!(self, Self::Estimation { .. })
    }
}

impl From<PolarsError> for PanelError {
    fn from(err: PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, PanelError>;
