//! Error types for stress-lens

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stress-lens operations
pub type Result<T> = std::result::Result<T, StressError>;

/// Broad failure category a caller can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or insufficient input data (file, columns, rows, classes, values)
    Input,
    /// Category value not seen when the encoding map was fitted
    Encoding,
    /// Feature vector does not match the fitted feature count/order
    Dimension,
    /// Configuration, IO or internal state problems
    Internal,
}

/// Main error type
#[derive(Error, Debug)]
pub enum StressError {
    #[error("Data file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Required column missing: {0}")]
    MissingColumn(String),

    #[error("Dataset is empty after dropping incomplete rows")]
    EmptyDataset,

    #[error("Need at least 2 classes with 2 rows each, found {found}")]
    InsufficientClasses { found: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown category '{value}' for field {field}")]
    UnknownCategory { field: String, value: String },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature order mismatch at position {position}: expected {expected}, got {actual}")]
    FeatureMismatch {
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Model not fitted")]
    ModelNotFitted,
}

impl StressError {
    /// Map the error onto the Input / Encoding / Dimension taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            StressError::MissingFile(_)
            | StressError::MissingColumn(_)
            | StressError::EmptyDataset
            | StressError::InsufficientClasses { .. }
            | StressError::InvalidInput(_)
            | StressError::DataError(_) => ErrorKind::Input,
            StressError::UnknownCategory { .. } => ErrorKind::Encoding,
            StressError::ShapeError { .. } | StressError::FeatureMismatch { .. } => {
                ErrorKind::Dimension
            }
            StressError::IoError(_)
            | StressError::ConfigError(_)
            | StressError::InvalidParameter { .. }
            | StressError::SerializationError(_)
            | StressError::ModelNotFitted => ErrorKind::Internal,
        }
    }
}

impl From<polars::error::PolarsError> for StressError {
    fn from(err: polars::error::PolarsError) -> Self {
        StressError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for StressError {
    fn from(err: serde_json::Error) -> Self {
        StressError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for StressError {
    fn from(err: ndarray::ShapeError) -> Self {
        StressError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
