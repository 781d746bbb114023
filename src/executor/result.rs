//! Result types for query execution

use serde_json::{Map, Value};

/// One output row, keyed by the COLUMNS keys in COLUMNS order
pub type ResultRow = Map<String, Value>;

/// Result of query execution
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    /// Rows in result order
    pub rows: Vec<ResultRow>,
    /// Number of rows in the dataset
    pub scanned_count: usize,
    /// Number of rows that passed WHERE
    pub matched_count: usize,
}

impl ExecutionResult {
    /// Returns true if no rows were produced
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of result rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Consumes the result, returning its rows
    pub fn into_rows(self) -> Vec<ResultRow> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_result() {
        let result = ExecutionResult::default();
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_into_rows() {
        let mut row = ResultRow::new();
        row.insert("courses_dept".into(), json!("cpsc"));
        let result = ExecutionResult {
            rows: vec![row.clone()],
            scanned_count: 3,
            matched_count: 1,
        };
        assert_eq!(result.len(), 1);
        assert_eq!(result.into_rows(), vec![row]);
    }
}
