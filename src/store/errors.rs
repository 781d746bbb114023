//! # Dataset Store Errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for dataset store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Dataset store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid dataset id: '{0}'")]
    InvalidId(String),

    #[error("Dataset already exists: {0}")]
    AlreadyExists(String),

    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("Dataset {0} has no rows")]
    Empty(String),

    #[error("Dataset {id}: row {index} is invalid: {reason}")]
    InvalidRow {
        id: String,
        index: usize,
        reason: String,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt dataset file {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl StoreError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidId(_) => "INSIGHT_INVALID_ID",
            StoreError::AlreadyExists(_) => "INSIGHT_DATASET_EXISTS",
            StoreError::NotFound(_) => "INSIGHT_DATASET_NOT_FOUND",
            StoreError::Empty(_) => "INSIGHT_DATASET_EMPTY",
            StoreError::InvalidRow { .. } => "INSIGHT_INVALID_ROW",
            StoreError::Io { .. } => "INSIGHT_IO_ERROR",
            StoreError::Corrupt { .. } => "INSIGHT_CORRUPT_DATASET",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
