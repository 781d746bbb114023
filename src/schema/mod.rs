//! Schema registry for insightdb
//!
//! Static field sets per record kind and the namespacing rule
//! `<datasetId>_<field>`.
//!
//! # Design Principles
//!
//! - Field sets are fixed at compile time
//! - Every field is either numeric or string typed
//! - Field names never collide across kinds

mod record;
mod types;

pub use record::{number_value, FieldValue, Record, Room, Section};
pub use types::{split_key, DatasetKind, FieldDef, FieldType, KEY_SEPARATOR};
