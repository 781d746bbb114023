//! Query validator subsystem for insightdb
//!
//! Turns an untyped JSON query into a typed, single-dataset-bound
//! `ValidatedQuery`, or rejects it.
//!
//! # Design Principles
//!
//! - One pass: parsing and validation happen together
//! - The dataset id binding is request-local and explicitly threaded
//! - Every rejection is `INSIGHT_MALFORMED_QUERY` with a reason
//! - No partial results

mod ast;
mod binding;
mod errors;
mod validator;

pub use ast::{
    ApplyRule, ApplyToken, ColumnKey, Comparison, Direction, FieldRef, Filter, Order, Pattern,
    Transform, ValidatedQuery,
};
pub use binding::{DatasetBinding, DatasetCatalog};
pub use errors::{QueryError, QueryErrorCode, QueryResult};
pub use validator::QueryValidator;
