//! Dataset store subsystem for insightdb
//!
//! Holds the resident datasets queries run against, optionally mirrored to
//! a data directory.
//!
//! # Design Principles
//!
//! - Datasets are added and removed whole, never mutated in place
//! - Queries hold an `Arc` snapshot for their whole execution
//! - On-disk files are written atomically via rename

mod dataset;
mod errors;
mod persist;
mod store;

pub use dataset::{validate_id, Dataset, DatasetInfo};
pub use errors::{StoreError, StoreResult};
pub use persist::DatasetPersistence;
pub use store::DatasetStore;
