//! # Dataset Registry
//!
//! Shared map of resident datasets. Readers clone an `Arc` snapshot under a
//! short read lock; writers swap whole entries under the write lock, so a
//! running query never observes a partially added or removed dataset.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::executor::DatasetSource;
use crate::query::DatasetCatalog;
use crate::schema::DatasetKind;

use super::dataset::{validate_id, Dataset, DatasetInfo};
use super::errors::{StoreError, StoreResult};

/// In-memory dataset registry
#[derive(Debug, Default)]
pub struct DatasetStore {
    datasets: RwLock<HashMap<String, Arc<Dataset>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dataset and returns the ids of all resident datasets
    pub fn add(&self, dataset: Dataset) -> StoreResult<Vec<String>> {
        validate_id(dataset.id())?;
        if dataset.is_empty() {
            return Err(StoreError::Empty(dataset.id().to_string()));
        }

        let mut datasets = self.datasets.write().unwrap_or_else(PoisonError::into_inner);
        if datasets.contains_key(dataset.id()) {
            return Err(StoreError::AlreadyExists(dataset.id().to_string()));
        }
        datasets.insert(dataset.id().to_string(), Arc::new(dataset));

        let mut ids: Vec<String> = datasets.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Removes a dataset, returning the removed snapshot
    pub fn remove(&self, id: &str) -> StoreResult<Arc<Dataset>> {
        validate_id(id)?;
        let mut datasets = self.datasets.write().unwrap_or_else(PoisonError::into_inner);
        datasets
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Returns a snapshot of a dataset
    pub fn get(&self, id: &str) -> Option<Arc<Dataset>> {
        self.datasets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.datasets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Lists every resident dataset, sorted by id
    pub fn list(&self) -> Vec<DatasetInfo> {
        let mut infos: Vec<DatasetInfo> = self
            .datasets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|d| d.info())
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    pub fn len(&self) -> usize {
        self.datasets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DatasetCatalog for DatasetStore {
    fn kind_of(&self, dataset_id: &str) -> Option<DatasetKind> {
        self.get(dataset_id).map(|d| d.kind())
    }
}

impl DatasetSource for DatasetStore {
    fn dataset(&self, dataset_id: &str) -> Option<Arc<Dataset>> {
        self.get(dataset_id)
    }
}
