//! InsightEngine facade
//!
//! Owns the dataset store and, optionally, its on-disk mirror. Dataset
//! additions and removals are serialized here; queries run concurrently
//! against `Arc` snapshots and never take the write lock.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::executor::{
    ExecutionResult, ExecutorConfig, QueryExecutor, ResultRow, DEFAULT_MAX_RESULT_ROWS,
};
use crate::observability::{log_event, log_event_with_fields, Event, ObservationScope};
use crate::query::QueryResult;
use crate::schema::DatasetKind;
use crate::store::{
    validate_id, Dataset, DatasetInfo, DatasetPersistence, DatasetStore, StoreError, StoreResult,
};

/// Engine construction options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directory mirroring resident datasets; `None` keeps everything in memory
    pub data_dir: Option<PathBuf>,
    /// Largest result a query may return
    pub max_result_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_result_rows: DEFAULT_MAX_RESULT_ROWS,
        }
    }
}

/// Query engine over resident course and room datasets
pub struct InsightEngine {
    store: DatasetStore,
    persistence: Option<DatasetPersistence>,
    executor_config: ExecutorConfig,
    write_lock: Mutex<()>,
}

impl InsightEngine {
    /// Creates an engine with no persistence and the default ceiling
    pub fn in_memory() -> Self {
        Self {
            store: DatasetStore::new(),
            persistence: None,
            executor_config: ExecutorConfig::default(),
            write_lock: Mutex::new(()),
        }
    }

    /// Opens an engine mirrored to `data_dir`, loading every dataset in it
    pub fn open(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::with_config(EngineConfig {
            data_dir: Some(data_dir.into()),
            ..EngineConfig::default()
        })
    }

    /// Boots an engine from a configuration.
    ///
    /// Any dataset file that fails to load aborts the boot.
    pub fn with_config(config: EngineConfig) -> StoreResult<Self> {
        log_event(Event::BootStart);

        let mut engine = Self::in_memory();
        engine.executor_config = ExecutorConfig {
            max_result_rows: config.max_result_rows,
        };

        if let Some(dir) = config.data_dir {
            let persistence = DatasetPersistence::open(dir)?;
            let datasets = persistence.load_all().map_err(|e| {
                log_event_with_fields(
                    Event::DatasetLoadFailed,
                    &[("code", e.code()), ("reason", e.to_string().as_str())],
                );
                e
            })?;
            let count = datasets.len();
            for dataset in datasets {
                engine.store.add(dataset)?;
            }
            log_event_with_fields(
                Event::DatasetsLoaded,
                &[
                    ("count", count.to_string().as_str()),
                    ("data_dir", persistence.root().display().to_string().as_str()),
                ],
            );
            engine.persistence = Some(persistence);
        }

        log_event(Event::BootComplete);
        Ok(engine)
    }

    /// Registers a dataset from un-namespaced rows.
    ///
    /// Returns the ids of all resident datasets, including the new one.
    pub fn add_dataset(
        &self,
        id: &str,
        kind: DatasetKind,
        rows: Vec<Value>,
    ) -> StoreResult<Vec<String>> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let result = self.add_locked(id, kind, rows);
        match &result {
            Ok(_) => log_event_with_fields(
                Event::DatasetAdded,
                &[("dataset", id), ("kind", kind.as_str())],
            ),
            Err(e) => log_event_with_fields(
                Event::DatasetRejected,
                &[("code", e.code()), ("dataset", id), ("reason", e.to_string().as_str())],
            ),
        }
        result
    }

    fn add_locked(&self, id: &str, kind: DatasetKind, rows: Vec<Value>) -> StoreResult<Vec<String>> {
        validate_id(id)?;
        if self.store.contains(id) {
            return Err(StoreError::AlreadyExists(id.to_string()));
        }
        let dataset = Dataset::from_json_rows(id, kind, rows)?;
        if let Some(persistence) = &self.persistence {
            persistence.save(&dataset)?;
        }
        self.store.add(dataset)
    }

    /// Removes a dataset, returning its id.
    ///
    /// The file goes first: if it cannot be deleted the dataset stays
    /// resident, so memory and disk never disagree.
    pub fn remove_dataset(&self, id: &str) -> StoreResult<String> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.remove_locked(id) {
            Ok(removed) => {
                log_event_with_fields(Event::DatasetRemoved, &[("dataset", id)]);
                Ok(removed)
            }
            Err(e) => {
                log_event_with_fields(
                    Event::DatasetRejected,
                    &[("code", e.code()), ("dataset", id), ("reason", e.to_string().as_str())],
                );
                Err(e)
            }
        }
    }

    fn remove_locked(&self, id: &str) -> StoreResult<String> {
        validate_id(id)?;
        if !self.store.contains(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        if let Some(persistence) = &self.persistence {
            persistence.delete(id)?;
        }
        let removed = self.store.remove(id)?;
        Ok(removed.id().to_string())
    }

    /// Lists every resident dataset, sorted by id
    pub fn list_datasets(&self) -> Vec<DatasetInfo> {
        self.store.list()
    }

    /// Runs a query, returning only its rows
    pub fn perform_query(&self, query: &Value) -> QueryResult<Vec<ResultRow>> {
        self.execute(query).map(ExecutionResult::into_rows)
    }

    /// Runs a query, returning rows and scan statistics
    pub fn execute(&self, query: &Value) -> QueryResult<ExecutionResult> {
        let scope = ObservationScope::new(Event::QueryReceived, &[]);
        let executor = QueryExecutor::with_config(&self.store, self.executor_config);
        match executor.execute(query) {
            Ok(result) => {
                scope.complete(
                    Event::QueryExecuted,
                    &[
                        ("matched", result.matched_count.to_string().as_str()),
                        ("rows", result.len().to_string().as_str()),
                        ("scanned", result.scanned_count.to_string().as_str()),
                    ],
                );
                Ok(result)
            }
            Err(e) => {
                scope.fail(Event::QueryRejected, e.code().code(), e.message());
                Err(e)
            }
        }
    }
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryErrorCode;
    use serde_json::json;
    use tempfile::TempDir;

    fn room(shortname: &str, number: &str, seats: u32) -> Value {
        json!({
            "fullname": format!("{} Building", shortname), "shortname": shortname,
            "number": number, "name": format!("{}_{}", shortname, number),
            "address": "2329 West Mall", "lat": 49.26, "lon": -123.25, "seats": seats,
            "type": "Small Group", "furniture": "Classroom-Movable Tables & Chairs",
            "href": format!("http://example.org/{}-{}", shortname, number)
        })
    }

    #[test]
    fn test_add_query_remove() {
        let engine = InsightEngine::in_memory();
        let ids = engine
            .add_dataset(
                "rooms",
                DatasetKind::Rooms,
                vec![room("DMP", "110", 120), room("DMP", "201", 40), room("ANGU", "098", 260)],
            )
            .unwrap();
        assert_eq!(ids, vec!["rooms"]);

        let rows = engine
            .perform_query(&json!({
                "WHERE": {"GT": {"rooms_seats": 100}},
                "OPTIONS": {"COLUMNS": ["rooms_name"], "ORDER": "rooms_name"}
            }))
            .unwrap();
        assert_eq!(
            Value::Array(rows.into_iter().map(Value::Object).collect()),
            json!([{"rooms_name": "ANGU_098"}, {"rooms_name": "DMP_110"}])
        );

        assert_eq!(engine.remove_dataset("rooms").unwrap(), "rooms");
        let err = engine
            .perform_query(&json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["rooms_name"]}}))
            .unwrap_err();
        assert_eq!(err.code(), QueryErrorCode::DatasetNotFound);
    }

    #[test]
    fn test_add_rejects_duplicate_and_bad_rows() {
        let engine = InsightEngine::in_memory();
        engine
            .add_dataset("rooms", DatasetKind::Rooms, vec![room("DMP", "110", 120)])
            .unwrap();
        assert!(matches!(
            engine.add_dataset("rooms", DatasetKind::Rooms, vec![room("DMP", "110", 120)]),
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(matches!(
            engine.add_dataset("other", DatasetKind::Courses, vec![room("DMP", "110", 120)]),
            Err(StoreError::InvalidRow { .. })
        ));
        assert_eq!(engine.list_datasets().len(), 1);
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = TempDir::new().unwrap();
        {
            let engine = InsightEngine::open(dir.path()).unwrap();
            engine
                .add_dataset("rooms", DatasetKind::Rooms, vec![room("DMP", "110", 120)])
                .unwrap();
            engine
                .add_dataset("gone", DatasetKind::Rooms, vec![room("DMP", "110", 120)])
                .unwrap();
            engine.remove_dataset("gone").unwrap();
        }
        let reopened = InsightEngine::open(dir.path()).unwrap();
        let listed = reopened.list_datasets();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "rooms");
        assert_eq!(listed[0].num_rows, 1);
    }

    #[test]
    fn test_failed_file_delete_keeps_dataset() {
        let dir = TempDir::new().unwrap();
        let engine = InsightEngine::open(dir.path()).unwrap();
        engine
            .add_dataset("rooms", DatasetKind::Rooms, vec![room("DMP", "110", 120)])
            .unwrap();

        // A non-empty directory in place of the dataset file cannot be unlinked
        let file = dir.path().join("rooms.json");
        std::fs::remove_file(&file).unwrap();
        std::fs::create_dir(&file).unwrap();
        std::fs::write(file.join("keep"), b"x").unwrap();

        assert!(matches!(
            engine.remove_dataset("rooms"),
            Err(StoreError::Io { .. })
        ));
        assert_eq!(engine.list_datasets().len(), 1);
        let rows = engine
            .perform_query(&json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["rooms_name"]}}))
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_remove_unknown_dataset() {
        let engine = InsightEngine::in_memory();
        assert!(matches!(
            engine.remove_dataset("ghost"),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            engine.remove_dataset("bad_id"),
            Err(StoreError::InvalidId(_))
        ));
    }

    #[test]
    fn test_configured_ceiling() {
        let engine = InsightEngine::with_config(EngineConfig {
            data_dir: None,
            max_result_rows: 1,
        })
        .unwrap();
        engine
            .add_dataset(
                "rooms",
                DatasetKind::Rooms,
                vec![room("DMP", "110", 120), room("DMP", "201", 40)],
            )
            .unwrap();
        let err = engine
            .perform_query(&json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["rooms_name"]}}))
            .unwrap_err();
        assert_eq!(err.code(), QueryErrorCode::ResultTooLarge);
    }
}
