//! Typed dataset records
//!
//! Records are immutable once ingested. Fields are addressed by their
//! un-namespaced name.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::DatasetKind;

/// One section of an academic course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub dept: String,
    pub id: String,
    pub instructor: String,
    pub title: String,
    pub uuid: String,
    pub avg: f64,
    pub pass: f64,
    pub fail: f64,
    pub audit: f64,
    pub year: f64,
}

/// One bookable campus room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub fullname: String,
    pub shortname: String,
    pub number: String,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    pub seats: f64,
    #[serde(rename = "type")]
    pub room_type: String,
    pub furniture: String,
    pub href: String,
}

/// A borrowed field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Text(&'a str),
}

impl<'a> FieldValue<'a> {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    /// Converts to a JSON value; integral numbers become JSON integers
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Number(n) => number_value(*n),
            FieldValue::Text(s) => Value::String((*s).to_string()),
        }
    }
}

/// Encodes a number as JSON, preferring the integer form when exact.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// A single row of a dataset
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Section(Section),
    Room(Room),
}

impl Record {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Record::Section(_) => DatasetKind::Courses,
            Record::Room(_) => DatasetKind::Rooms,
        }
    }

    /// Deserializes an un-namespaced field map into a record of `kind`
    pub fn from_json(kind: DatasetKind, row: Value) -> Result<Self, serde_json::Error> {
        match kind {
            DatasetKind::Courses => serde_json::from_value(row).map(Record::Section),
            DatasetKind::Rooms => serde_json::from_value(row).map(Record::Room),
        }
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            Record::Section(s) => serde_json::to_value(s),
            Record::Room(r) => serde_json::to_value(r),
        }
    }

    /// Reads a field by its un-namespaced name
    pub fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match self {
            Record::Section(s) => s.field(name),
            Record::Room(r) => r.field(name),
        }
    }
}

impl Section {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "dept" => FieldValue::Text(&self.dept),
            "id" => FieldValue::Text(&self.id),
            "instructor" => FieldValue::Text(&self.instructor),
            "title" => FieldValue::Text(&self.title),
            "uuid" => FieldValue::Text(&self.uuid),
            "avg" => FieldValue::Number(self.avg),
            "pass" => FieldValue::Number(self.pass),
            "fail" => FieldValue::Number(self.fail),
            "audit" => FieldValue::Number(self.audit),
            "year" => FieldValue::Number(self.year),
            _ => return None,
        };
        Some(value)
    }
}

impl Room {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "fullname" => FieldValue::Text(&self.fullname),
            "shortname" => FieldValue::Text(&self.shortname),
            "number" => FieldValue::Text(&self.number),
            "name" => FieldValue::Text(&self.name),
            "address" => FieldValue::Text(&self.address),
            "type" => FieldValue::Text(&self.room_type),
            "furniture" => FieldValue::Text(&self.furniture),
            "href" => FieldValue::Text(&self.href),
            "lat" => FieldValue::Number(self.lat),
            "lon" => FieldValue::Number(self.lon),
            "seats" => FieldValue::Number(self.seats),
            _ => return None,
        };
        Some(value)
    }
}
