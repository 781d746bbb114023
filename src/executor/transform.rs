//! GROUP / APPLY execution
//!
//! Groups are refined one GROUP key at a time, left to right, keeping
//! first-seen order within every refinement step. Each final group yields a
//! single row holding the GROUP keys and one column per APPLY rule.

use std::collections::{HashMap, HashSet};

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::observability::{log_event_with_fields, Event};
use crate::query::{ApplyRule, ApplyToken, FieldRef, Transform};
use crate::schema::{number_value, FieldValue, Record};

use super::filters::RowHandle;
use super::result::ResultRow;

/// Fractional digits kept by SUM and AVG
const AGGREGATE_SCALE: u32 = 2;

/// Hashable identity of a field value used for grouping and COUNT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GroupValue<'a> {
    Number(u64),
    Text(&'a str),
    Missing,
}

impl<'a> GroupValue<'a> {
    fn of(value: Option<FieldValue<'a>>) -> Self {
        match value {
            // 0.0 and -0.0 are one group
            Some(FieldValue::Number(n)) if n == 0.0 => GroupValue::Number(0f64.to_bits()),
            Some(FieldValue::Number(n)) => GroupValue::Number(n.to_bits()),
            Some(FieldValue::Text(s)) => GroupValue::Text(s),
            None => GroupValue::Missing,
        }
    }
}

/// Executes TRANSFORMATIONS over filtered rows
pub struct TransformEngine;

impl TransformEngine {
    /// Produces one row per distinct group-key tuple, in first-seen order.
    pub fn apply(transform: &Transform, rows: &[Record], handles: &[RowHandle]) -> Vec<ResultRow> {
        Self::partition(&transform.group, rows, handles)
            .iter()
            .map(|group| Self::summarize(transform, rows, group))
            .collect()
    }

    /// Splits `handles` into groups by refining on each key in turn
    pub fn partition(
        keys: &[FieldRef],
        rows: &[Record],
        handles: &[RowHandle],
    ) -> Vec<Vec<RowHandle>> {
        let mut groups = if handles.is_empty() {
            Vec::new()
        } else {
            vec![handles.to_vec()]
        };
        for key in keys {
            groups = groups
                .into_iter()
                .flat_map(|group| Self::split(key, rows, group))
                .collect();
        }
        groups
    }

    fn split(key: &FieldRef, rows: &[Record], group: Vec<RowHandle>) -> Vec<Vec<RowHandle>> {
        let mut positions: HashMap<GroupValue<'_>, usize> = HashMap::new();
        let mut parts: Vec<Vec<RowHandle>> = Vec::new();
        for handle in group {
            let value = GroupValue::of(rows[handle].field(key.field));
            let index = *positions.entry(value).or_insert_with(|| {
                parts.push(Vec::new());
                parts.len() - 1
            });
            parts[index].push(handle);
        }
        parts
    }

    fn summarize(transform: &Transform, rows: &[Record], group: &[RowHandle]) -> ResultRow {
        let mut row = ResultRow::new();
        if let Some(&first) = group.first() {
            let representative = &rows[first];
            for key in &transform.group {
                let value = representative
                    .field(key.field)
                    .map(|v| v.to_json())
                    .unwrap_or(Value::Null);
                row.insert(key.key.clone(), value);
            }
        }
        for rule in &transform.apply {
            row.insert(rule.name.clone(), Aggregate::compute(rule, rows, group));
        }
        row
    }
}

/// APPLY token implementations
struct Aggregate;

impl Aggregate {
    fn compute(rule: &ApplyRule, rows: &[Record], group: &[RowHandle]) -> Value {
        let numbers = || {
            group
                .iter()
                .filter_map(|&h| rows[h].field(rule.field.field).and_then(|v| v.as_number()))
        };

        match rule.token {
            ApplyToken::Max => number_value(numbers().fold(f64::NEG_INFINITY, f64::max)),
            ApplyToken::Min => number_value(numbers().fold(f64::INFINITY, f64::min)),
            ApplyToken::Sum => Self::decimal_value(Self::decimal_sum(numbers())),
            ApplyToken::Avg => {
                let sum = Self::decimal_sum(numbers());
                let mean = sum
                    .checked_div(Decimal::from(group.len()))
                    .unwrap_or(Decimal::ZERO);
                Self::decimal_value(mean)
            }
            ApplyToken::Count => {
                let distinct: HashSet<GroupValue<'_>> = group
                    .iter()
                    .map(|&h| GroupValue::of(rows[h].field(rule.field.field)))
                    .collect();
                Value::from(distinct.len())
            }
        }
    }

    fn decimal_sum(values: impl Iterator<Item = f64>) -> Decimal {
        values.fold(Decimal::ZERO, |acc, v| acc.saturating_add(to_decimal(v)))
    }

    /// Rounds half away from zero on the final value only
    fn decimal_value(value: Decimal) -> Value {
        let rounded =
            value.round_dp_with_strategy(AGGREGATE_SCALE, RoundingStrategy::MidpointAwayFromZero);
        number_value(rounded.to_f64().unwrap_or(0.0))
    }
}

/// Converts through the shortest decimal rendering of `n`, so 0.1 is exactly
/// one tenth rather than its binary approximation.
///
/// `Decimal` holds magnitudes up to about 7.9e28. Larger inputs clamp to
/// `Decimal::MAX`/`MIN` and are logged; dataset values stay far below that.
fn to_decimal(n: f64) -> Decimal {
    if let Some(d) = n.to_string().parse::<Decimal>().ok().or_else(|| Decimal::from_f64(n)) {
        return d;
    }
    log_event_with_fields(Event::AggregateSaturated, &[("value", n.to_string().as_str())]);
    if n.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}
