//! # Datasets
//!
//! A dataset is an immutable, typed row array registered under an id. It is
//! replaced or removed as a whole, never mutated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{DatasetKind, Record, KEY_SEPARATOR};

use super::errors::{StoreError, StoreResult};

/// A resident dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    id: String,
    kind: DatasetKind,
    rows: Vec<Record>,
    loaded_at: DateTime<Utc>,
}

impl Dataset {
    /// Creates a dataset from already typed rows
    pub fn new(id: impl Into<String>, kind: DatasetKind, rows: Vec<Record>) -> Self {
        Self {
            id: id.into(),
            kind,
            rows,
            loaded_at: Utc::now(),
        }
    }

    /// Validates the id and types each un-namespaced row as `kind`
    pub fn from_json_rows(id: &str, kind: DatasetKind, rows: Vec<Value>) -> StoreResult<Self> {
        validate_id(id)?;
        if rows.is_empty() {
            return Err(StoreError::Empty(id.to_string()));
        }
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                Record::from_json(kind, row).map_err(|e| StoreError::InvalidRow {
                    id: id.to_string(),
                    index,
                    reason: e.to_string(),
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Self::new(id, kind, records))
    }

    /// Keeps the original registration time of a dataset reloaded from disk
    pub fn with_loaded_at(mut self, loaded_at: DateTime<Utc>) -> Self {
        self.loaded_at = loaded_at;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Summary shown by `list_datasets`
    pub fn info(&self) -> DatasetInfo {
        DatasetInfo {
            id: self.id.clone(),
            kind: self.kind,
            num_rows: self.rows.len(),
            loaded_at: self.loaded_at,
        }
    }
}

/// Listing entry for a resident dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    pub id: String,
    pub kind: DatasetKind,
    pub num_rows: usize,
    /// When the dataset was first registered
    pub loaded_at: DateTime<Utc>,
}

/// Checks that `id` can be used as a namespace prefix.
///
/// An id must contain a non-whitespace character and no `_`.
pub fn validate_id(id: &str) -> StoreResult<()> {
    if id.trim().is_empty() || id.contains(KEY_SEPARATOR) {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(())
}
