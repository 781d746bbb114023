//! Static field sets per dataset kind
//!
//! Every field is either numeric or string typed. Queries reference fields
//! through namespaced keys of the form `<datasetId>_<field>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between dataset id and field name in a namespaced key
pub const KEY_SEPARATOR: char = '_';

/// Kind of records held by a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// Academic course sections
    Courses,
    /// Campus rooms
    Rooms,
}

impl DatasetKind {
    /// All known kinds
    pub const ALL: [DatasetKind; 2] = [DatasetKind::Courses, DatasetKind::Rooms];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Courses => "courses",
            DatasetKind::Rooms => "rooms",
        }
    }

    /// Returns the field definitions for this kind
    pub fn fields(&self) -> &'static [FieldDef] {
        match self {
            DatasetKind::Courses => COURSES_FIELDS,
            DatasetKind::Rooms => ROOMS_FIELDS,
        }
    }

    /// Looks up a field definition by its un-namespaced name
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Returns the kind that declares the given field name.
    ///
    /// The two kinds share no field names, so the answer is unique.
    pub fn owning(name: &str) -> Option<(DatasetKind, &'static FieldDef)> {
        Self::ALL
            .iter()
            .find_map(|kind| kind.field(name).map(|def| (*kind, def)))
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "courses" => Ok(DatasetKind::Courses),
            "rooms" => Ok(DatasetKind::Rooms),
            other => Err(format!("unknown dataset kind '{}'", other)),
        }
    }
}

/// Value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Compared numerically, aggregatable by every APPLY token
    Numeric,
    /// Matched by IS, ordered lexically, only COUNT-able
    Text,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Numeric => "numeric",
            FieldType::Text => "string",
        }
    }
}

/// Field definition within a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub field_type: FieldType,
}

impl FieldDef {
    const fn numeric(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::Numeric,
        }
    }

    const fn text(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::Text,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.field_type == FieldType::Numeric
    }
}

const COURSES_FIELDS: &[FieldDef] = &[
    FieldDef::numeric("avg"),
    FieldDef::numeric("pass"),
    FieldDef::numeric("fail"),
    FieldDef::numeric("audit"),
    FieldDef::numeric("year"),
    FieldDef::text("dept"),
    FieldDef::text("id"),
    FieldDef::text("instructor"),
    FieldDef::text("title"),
    FieldDef::text("uuid"),
];

const ROOMS_FIELDS: &[FieldDef] = &[
    FieldDef::numeric("lat"),
    FieldDef::numeric("lon"),
    FieldDef::numeric("seats"),
    FieldDef::text("fullname"),
    FieldDef::text("shortname"),
    FieldDef::text("number"),
    FieldDef::text("name"),
    FieldDef::text("address"),
    FieldDef::text("type"),
    FieldDef::text("furniture"),
    FieldDef::text("href"),
];

/// Splits a namespaced key into `(dataset_id, field)` at the first separator.
///
/// Returns None when the key has no separator or an empty dataset id.
pub fn split_key(key: &str) -> Option<(&str, &str)> {
    let (id, field) = key.split_once(KEY_SEPARATOR)?;
    if id.is_empty() {
        return None;
    }
    Some((id, field))
}
