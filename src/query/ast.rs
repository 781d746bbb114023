//! Typed query representation
//!
//! Produced by the validator in a single pass over the raw JSON. Every value
//! of these types has already been checked against the bound dataset's
//! schema.

use crate::schema::{DatasetKind, FieldType};

/// A resolved reference to a dataset field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    /// Namespaced key as written in the query
    pub key: String,
    /// Un-namespaced field name
    pub field: &'static str,
    pub field_type: FieldType,
}

impl FieldRef {
    pub fn is_text(&self) -> bool {
        self.field_type == FieldType::Text
    }
}

/// IS pattern after wildcard analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `*` or `**`
    Any,
    /// No wildcard
    Exact(String),
    /// Trailing `*`
    Prefix(String),
    /// Leading `*`
    Suffix(String),
    /// Leading and trailing `*`
    Contains(String),
}

impl Pattern {
    /// Parses an IS pattern. Wildcards are only legal at either end.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "*" || raw == "**" {
            return Some(Pattern::Any);
        }
        let leading = raw.starts_with('*');
        let trailing = raw.ends_with('*');
        let start = usize::from(leading);
        let end = raw.len() - usize::from(trailing);
        let inner = &raw[start..end];
        if inner.contains('*') {
            return None;
        }
        let inner = inner.to_string();
        Some(match (leading, trailing) {
            (true, true) => Pattern::Contains(inner),
            (true, false) => Pattern::Suffix(inner),
            (false, true) => Pattern::Prefix(inner),
            (false, false) => Pattern::Exact(inner),
        })
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Exact(s) => value == s,
            Pattern::Prefix(s) => value.starts_with(s.as_str()),
            Pattern::Suffix(s) => value.ends_with(s.as_str()),
            Pattern::Contains(s) => value.contains(s.as_str()),
        }
    }
}

/// Numeric comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Gt,
    Eq,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Lt => "LT",
            Comparison::Gt => "GT",
            Comparison::Eq => "EQ",
        }
    }

    pub fn holds(&self, actual: f64, bound: f64) -> bool {
        match self {
            Comparison::Lt => actual < bound,
            Comparison::Gt => actual > bound,
            Comparison::Eq => actual == bound,
        }
    }
}

/// Validated WHERE filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `WHERE: {}`
    All,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Compare {
        op: Comparison,
        field: FieldRef,
        value: f64,
    },
    Is {
        field: FieldRef,
        pattern: Pattern,
    },
}

/// Aggregate token of an APPLY rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyToken {
    Max,
    Min,
    Avg,
    Sum,
    Count,
}

impl ApplyToken {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "MAX" => Some(ApplyToken::Max),
            "MIN" => Some(ApplyToken::Min),
            "AVG" => Some(ApplyToken::Avg),
            "SUM" => Some(ApplyToken::Sum),
            "COUNT" => Some(ApplyToken::Count),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyToken::Max => "MAX",
            ApplyToken::Min => "MIN",
            ApplyToken::Avg => "AVG",
            ApplyToken::Sum => "SUM",
            ApplyToken::Count => "COUNT",
        }
    }

    /// COUNT is the only token accepting string fields
    pub fn accepts(&self, field_type: FieldType) -> bool {
        matches!(self, ApplyToken::Count) || field_type == FieldType::Numeric
    }
}

/// One named aggregate column
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyRule {
    pub name: String,
    pub token: ApplyToken,
    pub field: FieldRef,
}

/// GROUP + APPLY
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub group: Vec<FieldRef>,
    pub apply: Vec<ApplyRule>,
}

/// A resolvable COLUMNS / ORDER key
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKey {
    /// Dataset field (raw, or a GROUP key under a transform)
    Field(FieldRef),
    /// APPLY output column
    Apply(String),
}

impl ColumnKey {
    /// Key as written in the query and as emitted in result rows
    pub fn name(&self) -> &str {
        match self {
            ColumnKey::Field(f) => &f.key,
            ColumnKey::Apply(name) => name,
        }
    }

    /// String-typed columns order lexically, everything else numerically
    pub fn is_text(&self) -> bool {
        match self {
            ColumnKey::Field(f) => f.is_text(),
            ColumnKey::Apply(_) => false,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// ORDER specification; a bare key is ascending on that key
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub dir: Direction,
    pub keys: Vec<ColumnKey>,
}

/// A query confirmed valid and bound to exactly one dataset id
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedQuery {
    pub dataset_id: String,
    pub kind: DatasetKind,
    pub filter: Filter,
    pub columns: Vec<ColumnKey>,
    pub order: Option<Order>,
    pub transform: Option<Transform>,
}

impl ValidatedQuery {
    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    pub fn has_order(&self) -> bool {
        self.order.is_some()
    }
}
