//! # Dataset Persistence
//!
//! Each dataset is one `<id>.json` file holding `{id, kind, rows}` in the
//! data directory. Writes go to a temporary file first and are renamed into
//! place, so a crash never leaves a half-written dataset behind.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::DatasetKind;

use super::dataset::Dataset;
use super::errors::{StoreError, StoreResult};

const DATASET_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

/// On-disk layout of one dataset
#[derive(Debug, Serialize, Deserialize)]
struct DatasetFile {
    id: String,
    kind: DatasetKind,
    #[serde(default = "Utc::now")]
    loaded_at: DateTime<Utc>,
    rows: Vec<Value>,
}

/// Directory-backed dataset persistence
#[derive(Debug, Clone)]
pub struct DatasetPersistence {
    root: PathBuf,
}

impl DatasetPersistence {
    /// Opens a data directory, creating it if needed
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.{}", id, DATASET_EXTENSION))
    }

    /// Writes a dataset file atomically
    pub fn save(&self, dataset: &Dataset) -> StoreResult<()> {
        let path = self.path_for(dataset.id());
        let rows = dataset
            .rows()
            .iter()
            .map(|r| r.to_json())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        let file = DatasetFile {
            id: dataset.id().to_string(),
            kind: dataset.kind(),
            loaded_at: dataset.loaded_at(),
            rows,
        };
        let bytes = serde_json::to_vec(&file).map_err(|e| StoreError::Corrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let temp = path.with_extension(TEMP_EXTENSION);
        let mut out = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp)
            .map_err(|e| StoreError::io(&temp, e))?;
        out.write_all(&bytes).map_err(|e| StoreError::io(&temp, e))?;
        // Contents must be durable before the rename publishes them
        out.sync_all().map_err(|e| StoreError::io(&temp, e))?;
        drop(out);

        fs::rename(&temp, &path).map_err(|e| StoreError::io(&path, e))?;
        self.sync_root();
        Ok(())
    }

    /// Flushes directory entries so a completed rename or unlink survives a crash
    fn sync_root(&self) {
        if let Ok(dir) = File::open(&self.root) {
            let _ = dir.sync_all();
        }
    }

    /// Deletes a dataset file; a missing file is not an error
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        let path = self.path_for(id);
        match fs::remove_file(&path) {
            Ok(()) => {
                self.sync_root();
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Loads every dataset file in the directory, sorted by file name
    pub fn load_all(&self) -> StoreResult<Vec<Dataset>> {
        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.root, e))?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(DATASET_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        paths.iter().map(|path| Self::load_file(path)).collect()
    }

    fn load_file(path: &Path) -> StoreResult<Dataset> {
        let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
        let file: DatasetFile = serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if stem != file.id {
            return Err(StoreError::Corrupt {
                path: path.to_path_buf(),
                reason: format!("file holds dataset '{}'", file.id),
            });
        }
        let dataset = Dataset::from_json_rows(&file.id, file.kind, file.rows)?;
        Ok(dataset.with_loaded_at(file.loaded_at))
    }
}
