//! Query validator
//!
//! Parses an untyped JSON query into a `ValidatedQuery` in one pass, or
//! rejects it with `INSIGHT_MALFORMED_QUERY`.
//!
//! Grammar:
//! - Query: `{WHERE, OPTIONS, TRANSFORMATIONS?}` and nothing else
//! - WHERE: `{}` or exactly one filter node
//! - Filter node: single-key object, one of AND/OR (non-empty array),
//!   LT/GT/EQ (numeric field -> number), IS (string field -> pattern),
//!   NOT (filter node)
//! - OPTIONS: `{COLUMNS}` or `{COLUMNS, ORDER}`
//! - TRANSFORMATIONS: exactly `{GROUP, APPLY}`
//!
//! Validation is pure: no partial result is ever produced.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::schema::{FieldType, KEY_SEPARATOR};

use super::ast::{
    ApplyRule, ApplyToken, ColumnKey, Comparison, Direction, FieldRef, Filter, Order, Pattern,
    Transform, ValidatedQuery,
};
use super::binding::{DatasetBinding, DatasetCatalog};
use super::errors::{QueryError, QueryResult};

const WHERE: &str = "WHERE";
const OPTIONS: &str = "OPTIONS";
const TRANSFORMATIONS: &str = "TRANSFORMATIONS";
const COLUMNS: &str = "COLUMNS";
const ORDER: &str = "ORDER";
const GROUP: &str = "GROUP";
const APPLY: &str = "APPLY";

/// Validates raw queries against the datasets known to a catalog
pub struct QueryValidator<'a, C: DatasetCatalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: DatasetCatalog + ?Sized> QueryValidator<'a, C> {
    /// Creates a new validator backed by the given catalog.
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Validates a query.
    ///
    /// Sections are checked in the order WHERE, TRANSFORMATIONS, OPTIONS so
    /// that GROUP and APPLY keys are known before COLUMNS are resolved.
    pub fn validate(&self, raw: &Value) -> QueryResult<ValidatedQuery> {
        let query = as_object(raw, "Query")?;

        if let Some(key) = query
            .keys()
            .find(|k| !matches!(k.as_str(), WHERE | OPTIONS | TRANSFORMATIONS))
        {
            return Err(QueryError::malformed(format!(
                "Invalid key '{}' in query",
                key
            )));
        }
        let where_clause = query
            .get(WHERE)
            .ok_or_else(|| QueryError::malformed("Missing WHERE"))?;
        let options = query
            .get(OPTIONS)
            .ok_or_else(|| QueryError::malformed("Missing OPTIONS"))?;

        let mut binding = DatasetBinding::new();

        let filter = self.parse_where(where_clause, &mut binding)?;
        let transform = match query.get(TRANSFORMATIONS) {
            Some(t) => Some(self.parse_transformations(t, &mut binding)?),
            None => None,
        };
        let (columns, order) = self.parse_options(options, transform.as_ref(), &mut binding)?;

        let dataset_id = binding
            .dataset_id()
            .ok_or_else(|| QueryError::malformed("Query references no dataset"))?
            .to_string();
        let kind = binding
            .kind()
            .ok_or_else(|| QueryError::malformed("Query references no dataset field"))?;

        Ok(ValidatedQuery {
            dataset_id,
            kind,
            filter,
            columns,
            order,
            transform,
        })
    }

    fn parse_where(&self, value: &Value, binding: &mut DatasetBinding) -> QueryResult<Filter> {
        let obj = as_object(value, WHERE)?;
        if obj.is_empty() {
            return Ok(Filter::All);
        }
        self.parse_filter(value, binding)
    }

    fn parse_filter(&self, value: &Value, binding: &mut DatasetBinding) -> QueryResult<Filter> {
        let (key, body) = single_entry(as_object(value, "Filter")?, "Filter")?;

        match key.as_str() {
            "AND" | "OR" => {
                let items = body
                    .as_array()
                    .ok_or_else(|| QueryError::malformed(format!("{} must be an array", key)))?;
                if items.is_empty() {
                    return Err(QueryError::malformed(format!(
                        "{} must be a non-empty array",
                        key
                    )));
                }
                let mut children = Vec::with_capacity(items.len());
                for item in items {
                    children.push(self.parse_filter(item, binding)?);
                }
                Ok(if key == "AND" {
                    Filter::And(children)
                } else {
                    Filter::Or(children)
                })
            }
            "LT" => self.parse_comparison(Comparison::Lt, body, binding),
            "GT" => self.parse_comparison(Comparison::Gt, body, binding),
            "EQ" => self.parse_comparison(Comparison::Eq, body, binding),
            "IS" => {
                let (field_key, pattern) = single_entry(as_object(body, "IS")?, "IS")?;
                let field = self.resolve_typed(field_key, FieldType::Text, "IS", binding)?;
                let raw = pattern.as_str().ok_or_else(|| {
                    QueryError::malformed(format!(
                        "IS value must be a string, found {}",
                        json_type_name(pattern)
                    ))
                })?;
                let pattern = Pattern::parse(raw).ok_or_else(|| {
                    QueryError::malformed(format!(
                        "Invalid IS pattern '{}': '*' only allowed at either end",
                        raw
                    ))
                })?;
                Ok(Filter::Is { field, pattern })
            }
            "NOT" => Ok(Filter::Not(Box::new(self.parse_filter(body, binding)?))),
            other => Err(QueryError::malformed(format!("Invalid filter key '{}'", other))),
        }
    }

    fn parse_comparison(
        &self,
        op: Comparison,
        body: &Value,
        binding: &mut DatasetBinding,
    ) -> QueryResult<Filter> {
        let (field_key, bound) = single_entry(as_object(body, op.as_str())?, op.as_str())?;
        let field = self.resolve_typed(field_key, FieldType::Numeric, op.as_str(), binding)?;
        let value = match bound {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
        .ok_or_else(|| {
            QueryError::malformed(format!(
                "{} value must be a number, found {}",
                op.as_str(),
                json_type_name(bound)
            ))
        })?;
        Ok(Filter::Compare { op, field, value })
    }

    fn resolve_typed(
        &self,
        key: &str,
        expected: FieldType,
        context: &str,
        binding: &mut DatasetBinding,
    ) -> QueryResult<FieldRef> {
        let field = binding.resolve(key, self.catalog)?;
        if field.field_type != expected {
            return Err(QueryError::malformed(format!(
                "{} requires a {} field, '{}' is {}",
                context,
                expected.as_str(),
                key,
                field.field_type.as_str()
            )));
        }
        Ok(field)
    }

    fn parse_transformations(
        &self,
        value: &Value,
        binding: &mut DatasetBinding,
    ) -> QueryResult<Transform> {
        let obj = as_object(value, TRANSFORMATIONS)?;
        let group = obj
            .get(GROUP)
            .ok_or_else(|| QueryError::malformed("TRANSFORMATIONS missing GROUP"))?;
        let apply = obj
            .get(APPLY)
            .ok_or_else(|| QueryError::malformed("TRANSFORMATIONS missing APPLY"))?;
        if obj.len() != 2 {
            return Err(QueryError::malformed(
                "TRANSFORMATIONS must contain exactly GROUP and APPLY",
            ));
        }

        let group_keys = as_key_list(group, GROUP)?;
        let mut group = Vec::with_capacity(group_keys.len());
        for key in group_keys {
            group.push(binding.resolve(key, self.catalog)?);
        }

        let rules = apply
            .as_array()
            .ok_or_else(|| QueryError::malformed("APPLY must be an array"))?;
        let mut names = HashSet::new();
        let mut apply = Vec::with_capacity(rules.len());
        for rule in rules {
            let rule = self.parse_apply_rule(rule, binding)?;
            if !names.insert(rule.name.clone()) {
                return Err(QueryError::malformed(format!(
                    "Duplicate APPLY key '{}'",
                    rule.name
                )));
            }
            apply.push(rule);
        }

        Ok(Transform { group, apply })
    }

    fn parse_apply_rule(
        &self,
        value: &Value,
        binding: &mut DatasetBinding,
    ) -> QueryResult<ApplyRule> {
        let (name, body) = single_entry(as_object(value, "APPLY rule")?, "APPLY rule")?;
        if name.is_empty() {
            return Err(QueryError::malformed("APPLY key cannot be empty"));
        }
        if name.contains(KEY_SEPARATOR) {
            return Err(QueryError::malformed(format!(
                "APPLY key '{}' cannot contain '{}'",
                name, KEY_SEPARATOR
            )));
        }

        let (token, target) = single_entry(as_object(body, "APPLY body")?, "APPLY body")?;
        let token = ApplyToken::parse(token)
            .ok_or_else(|| QueryError::malformed(format!("Invalid APPLY token '{}'", token)))?;
        let target = target.as_str().ok_or_else(|| {
            QueryError::malformed(format!("{} target must be a key", token.as_str()))
        })?;
        let field = binding.resolve(target, self.catalog)?;
        if !token.accepts(field.field_type) {
            return Err(QueryError::malformed(format!(
                "{} requires a numeric field, '{}' is {}",
                token.as_str(),
                target,
                field.field_type.as_str()
            )));
        }

        Ok(ApplyRule {
            name: name.clone(),
            token,
            field,
        })
    }

    fn parse_options(
        &self,
        value: &Value,
        transform: Option<&Transform>,
        binding: &mut DatasetBinding,
    ) -> QueryResult<(Vec<ColumnKey>, Option<Order>)> {
        let obj = as_object(value, OPTIONS)?;
        if let Some(key) = obj
            .keys()
            .find(|k| !matches!(k.as_str(), COLUMNS | ORDER))
        {
            return Err(QueryError::malformed(format!(
                "Invalid key '{}' in OPTIONS",
                key
            )));
        }
        let columns = obj
            .get(COLUMNS)
            .ok_or_else(|| QueryError::malformed("OPTIONS missing COLUMNS"))?;

        let mut resolved = Vec::new();
        for key in as_key_list(columns, COLUMNS)? {
            let column = match transform {
                Some(t) => Self::transform_column(t, key)?,
                None => ColumnKey::Field(binding.resolve(key, self.catalog)?),
            };
            resolved.push(column);
        }

        let order = match obj.get(ORDER) {
            Some(order) => Some(Self::parse_order(order, &resolved)?),
            None => None,
        };

        Ok((resolved, order))
    }

    /// Under a transform only GROUP and APPLY keys are visible
    fn transform_column(transform: &Transform, key: &str) -> QueryResult<ColumnKey> {
        if let Some(field) = transform.group.iter().find(|f| f.key == key) {
            return Ok(ColumnKey::Field(field.clone()));
        }
        if transform.apply.iter().any(|rule| rule.name == key) {
            return Ok(ColumnKey::Apply(key.to_string()));
        }
        Err(QueryError::malformed(format!(
            "COLUMNS key '{}' is neither a GROUP nor an APPLY key",
            key
        )))
    }

    fn parse_order(value: &Value, columns: &[ColumnKey]) -> QueryResult<Order> {
        let lookup = |key: &str| {
            columns
                .iter()
                .find(|c| c.name() == key)
                .cloned()
                .ok_or_else(|| {
                    QueryError::malformed(format!("ORDER key '{}' must be in COLUMNS", key))
                })
        };

        match value {
            Value::String(key) => Ok(Order {
                dir: Direction::Up,
                keys: vec![lookup(key.as_str())?],
            }),
            Value::Object(obj) => {
                let dir = obj
                    .get("dir")
                    .ok_or_else(|| QueryError::malformed("ORDER missing dir"))?;
                let keys = obj
                    .get("keys")
                    .ok_or_else(|| QueryError::malformed("ORDER missing keys"))?;
                if obj.len() != 2 {
                    return Err(QueryError::malformed(
                        "ORDER must contain exactly dir and keys",
                    ));
                }
                let dir = match dir.as_str() {
                    Some("UP") => Direction::Up,
                    Some("DOWN") => Direction::Down,
                    _ => {
                        return Err(QueryError::malformed(format!(
                            "Invalid ORDER dir {}",
                            dir
                        )))
                    }
                };
                let keys = as_key_list(keys, "ORDER keys")?
                    .into_iter()
                    .map(lookup)
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(Order { dir, keys })
            }
            other => Err(QueryError::malformed(format!(
                "ORDER must be a key or an object, found {}",
                json_type_name(other)
            ))),
        }
    }
}

fn as_object<'v>(value: &'v Value, what: &str) -> QueryResult<&'v Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        QueryError::malformed(format!(
            "{} must be an object, found {}",
            what,
            json_type_name(value)
        ))
    })
}

fn single_entry<'v>(
    obj: &'v Map<String, Value>,
    what: &str,
) -> QueryResult<(&'v String, &'v Value)> {
    let mut entries = obj.iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Ok(entry),
        _ => Err(QueryError::malformed(format!(
            "{} must have exactly one key, found {}",
            what,
            obj.len()
        ))),
    }
}

/// Non-empty array of strings
fn as_key_list<'v>(value: &'v Value, what: &str) -> QueryResult<Vec<&'v str>> {
    let items = value
        .as_array()
        .ok_or_else(|| QueryError::malformed(format!("{} must be an array", what)))?;
    if items.is_empty() {
        return Err(QueryError::malformed(format!(
            "{} must be a non-empty array",
            what
        )));
    }
    items
        .iter()
        .map(|item| {
            item.as_str().ok_or_else(|| {
                QueryError::malformed(format!(
                    "{} entries must be strings, found {}",
                    what,
                    json_type_name(item)
                ))
            })
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
