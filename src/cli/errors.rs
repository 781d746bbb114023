//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero status after an error
//! response is written.

use std::io;

use thiserror::Error;

use crate::query::QueryError;
use crate::store::StoreError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file error
    #[error("{0}")]
    Config(String),

    /// I/O or JSON error on an input or output stream
    #[error("{0}")]
    Io(String),

    /// Dataset registration or removal failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Query rejected
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl CliError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        CliError::Config(msg.into())
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        CliError::Io(msg.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "INSIGHT_CLI_CONFIG_ERROR",
            CliError::Io(_) => "INSIGHT_CLI_IO_ERROR",
            CliError::Store(e) => e.code(),
            CliError::Query(e) => e.code().code(),
        }
    }

    /// Get the error message without its code
    pub fn message(&self) -> String {
        match self {
            CliError::Query(e) => e.message().to_string(),
            other => other.to_string(),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
