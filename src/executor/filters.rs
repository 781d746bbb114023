//! Filter evaluation for query execution
//!
//! Walks the validated filter tree directly. Rows are identified by their
//! index in the dataset, never by value, so two rows with identical fields
//! stay distinct through AND/OR/NOT.

use std::collections::HashSet;

use crate::query::Filter;
use crate::schema::Record;

/// Stable handle of a row: its index in the dataset's backing array
pub type RowHandle = usize;

/// Evaluates filter trees against dataset rows
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Returns the subset of `candidates` whose rows satisfy `filter`.
    ///
    /// Output preserves the order of `candidates`.
    pub fn evaluate(filter: &Filter, rows: &[Record], candidates: &[RowHandle]) -> Vec<RowHandle> {
        match filter {
            Filter::All => candidates.to_vec(),
            Filter::And(children) => {
                // Filters are row-local, so narrowing the input is the same as
                // intersecting each child's result over the original input.
                let mut matched = candidates.to_vec();
                for child in children {
                    if matched.is_empty() {
                        break;
                    }
                    matched = Self::evaluate(child, rows, &matched);
                }
                matched
            }
            Filter::Or(children) => {
                let mut hits: HashSet<RowHandle> = HashSet::new();
                for child in children {
                    hits.extend(Self::evaluate(child, rows, candidates));
                }
                Self::retain(candidates, |handle| hits.contains(&handle))
            }
            Filter::Not(inner) => {
                let excluded: HashSet<RowHandle> =
                    Self::evaluate(inner, rows, candidates).into_iter().collect();
                Self::retain(candidates, |handle| !excluded.contains(&handle))
            }
            Filter::Compare { op, field, value } => Self::retain(candidates, |handle| {
                rows[handle]
                    .field(field.field)
                    .and_then(|v| v.as_number())
                    .map_or(false, |actual| op.holds(actual, *value))
            }),
            Filter::Is { field, pattern } => Self::retain(candidates, |handle| {
                rows[handle]
                    .field(field.field)
                    .and_then(|v| v.as_text())
                    .map_or(false, |actual| pattern.matches(actual))
            }),
        }
    }

    fn retain(candidates: &[RowHandle], keep: impl Fn(RowHandle) -> bool) -> Vec<RowHandle> {
        candidates.iter().copied().filter(|h| keep(*h)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Comparison, FieldRef, Pattern};
    use crate::schema::{DatasetKind, FieldType};
    use serde_json::json;

    fn section(dept: &str, avg: f64) -> Record {
        Record::from_json(
            DatasetKind::Courses,
            json!({
                "dept": dept, "id": "310", "instructor": "", "title": "sw eng",
                "uuid": "1", "avg": avg, "pass": 10, "fail": 0, "audit": 0, "year": 2015
            }),
        )
        .unwrap()
    }

    fn avg_ref() -> FieldRef {
        FieldRef {
            key: "courses_avg".into(),
            field: "avg",
            field_type: FieldType::Numeric,
        }
    }

    fn dept_ref() -> FieldRef {
        FieldRef {
            key: "courses_dept".into(),
            field: "dept",
            field_type: FieldType::Text,
        }
    }

    fn gt(value: f64) -> Filter {
        Filter::Compare {
            op: Comparison::Gt,
            field: avg_ref(),
            value,
        }
    }

    fn is(pattern: &str) -> Filter {
        Filter::Is {
            field: dept_ref(),
            pattern: Pattern::parse(pattern).unwrap(),
        }
    }

    fn rows() -> Vec<Record> {
        vec![
            section("cpsc", 90.0),
            section("math", 70.0),
            section("cpsc", 60.0),
            section("cpsc", 90.0),
            section("phys", 95.0),
        ]
    }

    fn all(rows: &[Record]) -> Vec<RowHandle> {
        (0..rows.len()).collect()
    }

    fn set(handles: Vec<RowHandle>) -> HashSet<RowHandle> {
        handles.into_iter().collect()
    }

    #[test]
    fn test_match_all() {
        let rows = rows();
        assert_eq!(FilterEvaluator::evaluate(&Filter::All, &rows, &all(&rows)), all(&rows));
    }

    #[test]
    fn test_comparisons() {
        let rows = rows();
        let r = all(&rows);
        assert_eq!(FilterEvaluator::evaluate(&gt(85.0), &rows, &r), vec![0, 3, 4]);
        let eq = Filter::Compare {
            op: Comparison::Eq,
            field: avg_ref(),
            value: 90.0,
        };
        assert_eq!(FilterEvaluator::evaluate(&eq, &rows, &r), vec![0, 3]);
        let lt = Filter::Compare {
            op: Comparison::Lt,
            field: avg_ref(),
            value: 70.0,
        };
        assert_eq!(FilterEvaluator::evaluate(&lt, &rows, &r), vec![2]);
    }

    #[test]
    fn test_wildcards() {
        let rows = rows();
        let r = all(&rows);
        assert_eq!(FilterEvaluator::evaluate(&is("cp*"), &rows, &r), vec![0, 2, 3]);
        assert_eq!(FilterEvaluator::evaluate(&is("*th"), &rows, &r), vec![1]);
        assert_eq!(FilterEvaluator::evaluate(&is("*hy*"), &rows, &r), vec![4]);
        assert_eq!(FilterEvaluator::evaluate(&is("cpsc"), &rows, &r), vec![0, 2, 3]);
        assert_eq!(FilterEvaluator::evaluate(&is("cps"), &rows, &r), Vec::<RowHandle>::new());
        assert_eq!(FilterEvaluator::evaluate(&is("**"), &rows, &r), r);
    }

    #[test]
    fn test_set_algebra() {
        let rows = rows();
        let r = all(&rows);
        let a = gt(80.0);
        let b = is("cpsc");
        let ea = set(FilterEvaluator::evaluate(&a, &rows, &r));
        let eb = set(FilterEvaluator::evaluate(&b, &rows, &r));

        let and = set(FilterEvaluator::evaluate(
            &Filter::And(vec![a.clone(), b.clone()]),
            &rows,
            &r,
        ));
        assert_eq!(and, ea.intersection(&eb).copied().collect::<HashSet<_>>());

        let or = set(FilterEvaluator::evaluate(
            &Filter::Or(vec![a.clone(), b.clone()]),
            &rows,
            &r,
        ));
        assert_eq!(or, ea.union(&eb).copied().collect::<HashSet<_>>());

        let not = set(FilterEvaluator::evaluate(&Filter::Not(Box::new(a)), &rows, &r));
        assert_eq!(
            not,
            set(r.clone()).difference(&ea).copied().collect::<HashSet<_>>()
        );
    }

    #[test]
    fn test_identical_rows_stay_distinct() {
        let rows = rows();
        let r = all(&rows);
        // Rows 0 and 3 are field-for-field equal
        assert_eq!(rows[0], rows[3]);

        let or = Filter::Or(vec![gt(85.0), is("cpsc")]);
        assert_eq!(FilterEvaluator::evaluate(&or, &rows, &r), vec![0, 2, 3, 4]);

        let not = Filter::Not(Box::new(is("math")));
        assert_eq!(FilterEvaluator::evaluate(&not, &rows, &r), vec![0, 2, 3, 4]);
    }

    #[test]
    fn test_or_preserves_input_order() {
        let rows = rows();
        let r = all(&rows);
        let or = Filter::Or(vec![is("phys"), is("math"), gt(85.0)]);
        assert_eq!(FilterEvaluator::evaluate(&or, &rows, &r), vec![0, 1, 3, 4]);
    }
}
