//! Query error types
//!
//! Error codes:
//! - INSIGHT_MALFORMED_QUERY (REJECT)
//! - INSIGHT_DATASET_NOT_FOUND (REJECT)
//! - INSIGHT_RESULT_TOO_LARGE (REJECT)
//!
//! All three are terminal: no retry, no partial result.

use std::fmt;

/// Query error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorCode {
    /// Any validator rejection
    MalformedQuery,
    /// Bound dataset id has no resident dataset
    DatasetNotFound,
    /// Projected row count above the ceiling
    ResultTooLarge,
}

impl QueryErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::MalformedQuery => "INSIGHT_MALFORMED_QUERY",
            QueryErrorCode::DatasetNotFound => "INSIGHT_DATASET_NOT_FOUND",
            QueryErrorCode::ResultTooLarge => "INSIGHT_RESULT_TOO_LARGE",
        }
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Query error with a single human-readable message
#[derive(Debug, Clone, PartialEq)]
pub struct QueryError {
    code: QueryErrorCode,
    message: String,
}

impl QueryError {
    /// Create a malformed query error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::MalformedQuery,
            message: reason.into(),
        }
    }

    /// Create a dataset not found error
    pub fn dataset_not_found(dataset_id: &str) -> Self {
        Self {
            code: QueryErrorCode::DatasetNotFound,
            message: format!("Dataset '{}' not found", dataset_id),
        }
    }

    /// Create a result too large error
    pub fn result_too_large(rows: usize, limit: usize) -> Self {
        Self {
            code: QueryErrorCode::ResultTooLarge,
            message: format!("Result of {} rows exceeds maximum of {}", rows, limit),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> QueryErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_malformed(&self) -> bool {
        self.code == QueryErrorCode::MalformedQuery
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for QueryError {}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
