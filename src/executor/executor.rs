//! Query executor for insightdb
//!
//! Executes queries against resident datasets, producing deterministic
//! results.
//!
//! Execution flow (strict order):
//! 1. Validate and bind the query to one dataset id
//! 2. Look up the bound dataset (absent: DatasetNotFound)
//! 3. Filter rows by WHERE
//! 4. Group and aggregate (if TRANSFORMATIONS)
//! 5. Project onto COLUMNS
//! 6. Enforce the result ceiling
//! 7. Apply ORDER (if specified)
//! 8. Return ordered rows

use std::sync::Arc;

use serde_json::Value;

use crate::query::{DatasetCatalog, QueryError, QueryResult, QueryValidator, ValidatedQuery};
use crate::store::Dataset;

use super::filters::{FilterEvaluator, RowHandle};
use super::projection::Projection;
use super::result::ExecutionResult;
use super::sorter::ResultSorter;
use super::transform::TransformEngine;

/// Largest result a query may return
pub const DEFAULT_MAX_RESULT_ROWS: usize = 5000;

/// Trait for reading resident datasets by id
pub trait DatasetSource: DatasetCatalog {
    /// Returns a snapshot of the dataset, if resident
    fn dataset(&self, dataset_id: &str) -> Option<Arc<Dataset>>;
}

/// Executor tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Result ceiling, checked after projection and before sorting
    pub max_result_rows: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_result_rows: DEFAULT_MAX_RESULT_ROWS,
        }
    }
}

/// Query executor that runs raw queries against a dataset source
pub struct QueryExecutor<'a, S: DatasetSource + ?Sized> {
    source: &'a S,
    config: ExecutorConfig,
}

impl<'a, S: DatasetSource + ?Sized> QueryExecutor<'a, S> {
    /// Creates a new executor with the default ceiling
    pub fn new(source: &'a S) -> Self {
        Self::with_config(source, ExecutorConfig::default())
    }

    pub fn with_config(source: &'a S, config: ExecutorConfig) -> Self {
        Self { source, config }
    }

    /// Validates and executes a raw query.
    ///
    /// This method is deterministic: same query + same data = same results.
    pub fn execute(&self, raw: &Value) -> QueryResult<ExecutionResult> {
        let query = QueryValidator::new(self.source).validate(raw)?;
        self.execute_validated(&query)
    }

    /// Executes an already validated query
    pub fn execute_validated(&self, query: &ValidatedQuery) -> QueryResult<ExecutionResult> {
        // Step 2: the snapshot stays alive for this execution even if the
        // dataset is removed concurrently
        let dataset = self
            .source
            .dataset(&query.dataset_id)
            .ok_or_else(|| QueryError::dataset_not_found(&query.dataset_id))?;
        if dataset.kind() != query.kind {
            return Err(QueryError::malformed(format!(
                "Dataset '{}' is a {} dataset",
                query.dataset_id,
                dataset.kind()
            )));
        }
        let rows = dataset.rows();

        // Step 3
        let all: Vec<RowHandle> = (0..rows.len()).collect();
        let matched = FilterEvaluator::evaluate(&query.filter, rows, &all);

        // Steps 4-5
        let mut projected = match &query.transform {
            Some(transform) => {
                let groups = TransformEngine::apply(transform, rows, &matched);
                Projection::from_groups(&query.columns, groups)
            }
            None => Projection::from_records(&query.columns, rows, &matched),
        };

        // Step 6: never sort-then-truncate
        if projected.len() > self.config.max_result_rows {
            return Err(QueryError::result_too_large(
                projected.len(),
                self.config.max_result_rows,
            ));
        }

        // Step 7
        if let Some(order) = &query.order {
            ResultSorter::sort(&mut projected, order);
        }

        Ok(ExecutionResult {
            rows: projected,
            scanned_count: rows.len(),
            matched_count: matched.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryErrorCode;
    use crate::schema::{DatasetKind, Record};
    use serde_json::json;
    use std::collections::HashMap;

    /// Mock source for testing
    struct MockSource {
        datasets: HashMap<String, Arc<Dataset>>,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                datasets: HashMap::new(),
            }
        }

        fn with(mut self, id: &str, kind: DatasetKind, rows: Vec<Value>) -> Self {
            let records = rows
                .into_iter()
                .map(|r| Record::from_json(kind, r).unwrap())
                .collect();
            self.datasets
                .insert(id.to_string(), Arc::new(Dataset::new(id, kind, records)));
            self
        }
    }

    impl DatasetCatalog for MockSource {
        fn kind_of(&self, dataset_id: &str) -> Option<DatasetKind> {
            self.datasets.get(dataset_id).map(|d| d.kind())
        }
    }

    impl DatasetSource for MockSource {
        fn dataset(&self, dataset_id: &str) -> Option<Arc<Dataset>> {
            self.datasets.get(dataset_id).cloned()
        }
    }

    fn section(dept: &str, id: &str, avg: f64, uuid: &str) -> Value {
        json!({
            "dept": dept, "id": id, "instructor": "smith, jane", "title": "intro",
            "uuid": uuid, "avg": avg, "pass": 40, "fail": 2, "audit": 0, "year": 2015
        })
    }

    fn source() -> MockSource {
        MockSource::new().with(
            "courses",
            DatasetKind::Courses,
            vec![
                section("cpsc", "310", 91.5, "1"),
                section("cpsc", "210", 78.0, "2"),
                section("math", "100", 97.25, "3"),
                section("phys", "101", 64.0, "4"),
            ],
        )
    }

    #[test]
    fn test_filter_project_sort() {
        let source = source();
        let result = QueryExecutor::new(&source)
            .execute(&json!({
                "WHERE": {"GT": {"courses_avg": 75}},
                "OPTIONS": {"COLUMNS": ["courses_dept", "courses_avg"], "ORDER": "courses_avg"}
            }))
            .unwrap();

        assert_eq!(result.scanned_count, 4);
        assert_eq!(result.matched_count, 3);
        assert_eq!(
            Value::Array(result.rows.into_iter().map(Value::Object).collect()),
            json!([
                {"courses_dept": "cpsc", "courses_avg": 78},
                {"courses_dept": "cpsc", "courses_avg": 91.5},
                {"courses_dept": "math", "courses_avg": 97.25}
            ])
        );
    }

    #[test]
    fn test_transform_then_order_down() {
        let source = source();
        let result = QueryExecutor::new(&source)
            .execute(&json!({
                "WHERE": {},
                "OPTIONS": {
                    "COLUMNS": ["courses_dept", "n"],
                    "ORDER": {"dir": "DOWN", "keys": ["n", "courses_dept"]}
                },
                "TRANSFORMATIONS": {
                    "GROUP": ["courses_dept"],
                    "APPLY": [{"n": {"COUNT": "courses_uuid"}}]
                }
            }))
            .unwrap();
        let depts: Vec<&str> = result
            .rows
            .iter()
            .map(|r| r["courses_dept"].as_str().unwrap())
            .collect();
        assert_eq!(depts, vec!["cpsc", "phys", "math"]);
    }

    #[test]
    fn test_missing_dataset() {
        let source = source();
        let err = QueryExecutor::new(&source)
            .execute(&json!({
                "WHERE": {},
                "OPTIONS": {"COLUMNS": ["ghost_avg"]}
            }))
            .unwrap_err();
        assert_eq!(err.code(), QueryErrorCode::DatasetNotFound);
    }

    #[test]
    fn test_malformed_beats_missing_dataset() {
        let source = source();
        let err = QueryExecutor::new(&source)
            .execute(&json!({
                "WHERE": {"IS": {"ghost_avg": "x"}},
                "OPTIONS": {"COLUMNS": ["ghost_avg"]}
            }))
            .unwrap_err();
        assert_eq!(err.code(), QueryErrorCode::MalformedQuery);
    }

    #[test]
    fn test_ceiling_checked_before_sort() {
        let rows = (0..5001)
            .map(|i| section("cpsc", "310", (i % 100) as f64, &i.to_string()))
            .collect();
        let source = MockSource::new().with("big", DatasetKind::Courses, rows);
        let err = QueryExecutor::new(&source)
            .execute(&json!({
                "WHERE": {},
                "OPTIONS": {"COLUMNS": ["big_uuid", "big_avg"], "ORDER": "big_avg"}
            }))
            .unwrap_err();
        assert_eq!(err.code(), QueryErrorCode::ResultTooLarge);
    }

    #[test]
    fn test_ceiling_applies_to_groups_not_rows() {
        let rows = (0..5001)
            .map(|i| section("cpsc", "310", 50.0, &i.to_string()))
            .collect();
        let source = MockSource::new().with("big", DatasetKind::Courses, rows);
        let result = QueryExecutor::new(&source)
            .execute(&json!({
                "WHERE": {},
                "OPTIONS": {"COLUMNS": ["big_dept", "n"]},
                "TRANSFORMATIONS": {
                    "GROUP": ["big_dept"],
                    "APPLY": [{"n": {"COUNT": "big_uuid"}}]
                }
            }))
            .unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows[0]["n"], json!(5001));
    }

    #[test]
    fn test_configured_ceiling() {
        let source = source();
        let executor = QueryExecutor::with_config(&source, ExecutorConfig { max_result_rows: 3 });
        let query = json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["courses_uuid"]}});
        let err = executor.execute(&query).unwrap_err();
        assert_eq!(err.code(), QueryErrorCode::ResultTooLarge);

        let exact = json!({
            "WHERE": {"GT": {"courses_avg": 70}},
            "OPTIONS": {"COLUMNS": ["courses_uuid"]}
        });
        assert_eq!(executor.execute(&exact).unwrap().len(), 3);
    }

    #[test]
    fn test_deterministic() {
        let source = source();
        let executor = QueryExecutor::new(&source);
        let query = json!({
            "WHERE": {"OR": [{"IS": {"courses_dept": "cp*"}}, {"LT": {"courses_avg": 70}}]},
            "OPTIONS": {"COLUMNS": ["courses_uuid", "courses_title"]}
        });
        let first = executor.execute(&query).unwrap().into_rows();
        let second = executor.execute(&query).unwrap().into_rows();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}
