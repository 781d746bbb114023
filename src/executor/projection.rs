//! Projection onto COLUMNS
//!
//! Raw dataset fields are read from the record by their un-namespaced name
//! and written under the COLUMNS key as given. Under a transform, rows
//! already carry GROUP and APPLY keys, so projection only selects and
//! reorders them.

use serde_json::Value;

use crate::query::ColumnKey;
use crate::schema::Record;

use super::filters::RowHandle;
use super::result::ResultRow;

/// Builds output rows restricted to COLUMNS
pub struct Projection;

impl Projection {
    /// Projects filtered dataset rows
    pub fn from_records(
        columns: &[ColumnKey],
        rows: &[Record],
        handles: &[RowHandle],
    ) -> Vec<ResultRow> {
        handles
            .iter()
            .map(|&handle| {
                let record = &rows[handle];
                columns
                    .iter()
                    .map(|column| {
                        let value = match column {
                            ColumnKey::Field(field) => record
                                .field(field.field)
                                .map(|v| v.to_json())
                                .unwrap_or(Value::Null),
                            ColumnKey::Apply(_) => Value::Null,
                        };
                        (column.name().to_string(), value)
                    })
                    .collect()
            })
            .collect()
    }

    /// Projects transform output rows
    pub fn from_groups(columns: &[ColumnKey], groups: Vec<ResultRow>) -> Vec<ResultRow> {
        groups
            .into_iter()
            .map(|group| {
                columns
                    .iter()
                    .map(|column| {
                        let value = group.get(column.name()).cloned().unwrap_or(Value::Null);
                        (column.name().to_string(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FieldRef;
    use crate::schema::{DatasetKind, FieldType};
    use serde_json::json;

    fn column(name: &'static str, field_type: FieldType) -> ColumnKey {
        ColumnKey::Field(FieldRef {
            key: format!("rooms_{}", name),
            field: name,
            field_type,
        })
    }

    fn room() -> Record {
        Record::from_json(
            DatasetKind::Rooms,
            json!({
                "fullname": "Hugh Dempster Pavilion", "shortname": "DMP", "number": "110",
                "name": "DMP_110", "address": "6245 Agronomy Road V6T 1Z4",
                "lat": 49.26125, "lon": -123.24807, "seats": 120,
                "type": "Tiered Large Group", "furniture": "Classroom-Fixed Tables/Movable Chairs",
                "href": "http://example.org/DMP-110"
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_projects_in_column_order() {
        let rows = vec![room()];
        let columns = vec![
            column("seats", FieldType::Numeric),
            column("name", FieldType::Text),
            column("type", FieldType::Text),
        ];
        let out = Projection::from_records(&columns, &rows, &[0]);
        let keys: Vec<&String> = out[0].keys().collect();
        assert_eq!(keys, vec!["rooms_seats", "rooms_name", "rooms_type"]);
        assert_eq!(out[0]["rooms_seats"], json!(120));
        assert_eq!(out[0]["rooms_type"], json!("Tiered Large Group"));
    }

    #[test]
    fn test_group_projection_selects() {
        let mut group = ResultRow::new();
        group.insert("rooms_shortname".into(), json!("DMP"));
        group.insert("maxSeats".into(), json!(120));
        let columns = vec![ColumnKey::Apply("maxSeats".into())];
        let out = Projection::from_groups(&columns, vec![group]);
        assert_eq!(Value::Object(out[0].clone()), json!({"maxSeats": 120}));
    }
}
