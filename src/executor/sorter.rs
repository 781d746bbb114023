//! Result sorting for query execution
//!
//! Sorts projected rows by the ORDER keys, left to right. The sort is
//! stable, so rows equal on every key keep their incoming order. DOWN
//! negates the combined comparison, not each key on its own.

use std::cmp::Ordering;

use icu_collator::{Collator, CollatorOptions};
use serde_json::Value;

use crate::query::{ColumnKey, Direction, Order};

use super::result::ResultRow;

/// Sorts result rows
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts rows according to an ORDER clause.
    ///
    /// Sort is stable and deterministic.
    pub fn sort(rows: &mut [ResultRow], order: &Order) {
        rows.sort_by(|a, b| {
            let ordering = order
                .keys
                .iter()
                .map(|key| Self::compare_key(key, a, b))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal);

            match order.dir {
                Direction::Up => ordering,
                Direction::Down => ordering.reverse(),
            }
        });
    }

    fn compare_key(key: &ColumnKey, a: &ResultRow, b: &ResultRow) -> Ordering {
        let a_val = a.get(key.name());
        let b_val = b.get(key.name());
        if key.is_text() {
            let a_s = a_val.and_then(Value::as_str).unwrap_or("");
            let b_s = b_val.and_then(Value::as_str).unwrap_or("");
            collate(a_s, b_s)
        } else {
            let a_n = a_val.and_then(Value::as_f64).unwrap_or(f64::NEG_INFINITY);
            let b_n = b_val.and_then(Value::as_f64).unwrap_or(f64::NEG_INFINITY);
            a_n.partial_cmp(&b_n).unwrap_or(Ordering::Equal)
        }
    }
}

thread_local! {
    /// Root-locale collator at tertiary strength, punctuation non-ignorable
    static ROOT_COLLATOR: Option<Collator> =
        Collator::try_new(&Default::default(), CollatorOptions::new()).ok();
}

/// Locale-aware string comparison under the Unicode root collation.
///
/// Accents and case only break ties left by the base letters. Strings the
/// collator considers equal fall back to code-point order so the sort stays
/// total.
pub fn collate(a: &str, b: &str) -> Ordering {
    ROOT_COLLATOR
        .with(|collator| match collator {
            Some(collator) => collator.compare(a, b),
            None => Ordering::Equal,
        })
        .then_with(|| a.cmp(b))
}
