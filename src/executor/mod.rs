//! Query Executor subsystem for insightdb
//!
//! The executor consumes validated queries and produces deterministic
//! results over one resident dataset snapshot.
//!
//! # Execution Flow (strict order)
//!
//! 1. Validate the query and bind its dataset id
//! 2. Look up the dataset snapshot
//! 3. Filter rows by WHERE
//! 4. Group and aggregate (if TRANSFORMATIONS)
//! 5. Project onto COLUMNS
//! 6. Enforce the result ceiling
//! 7. Apply ORDER (if specified)
//!
//! # Design Principles
//!
//! - Rows are addressed by index, never compared by value
//! - No stage performs I/O or suspends
//! - Oversized results fail before sorting, never truncate

mod executor;
mod filters;
mod projection;
mod result;
mod sorter;
mod transform;

pub use executor::{DatasetSource, ExecutorConfig, QueryExecutor, DEFAULT_MAX_RESULT_ROWS};
pub use filters::{FilterEvaluator, RowHandle};
pub use projection::Projection;
pub use result::{ExecutionResult, ResultRow};
pub use sorter::{collate, ResultSorter};
pub use transform::TransformEngine;
