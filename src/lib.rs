//! insightdb - an embedded query engine over course and room datasets
//!
//! Queries are JSON documents with WHERE, OPTIONS and optional
//! TRANSFORMATIONS sections. Each query is validated, bound to exactly one
//! resident dataset, filtered, optionally grouped and aggregated, projected,
//! size-checked and sorted.

pub mod cli;
pub mod engine;
pub mod executor;
pub mod observability;
pub mod query;
pub mod schema;
pub mod store;

pub use engine::{EngineConfig, InsightEngine};
