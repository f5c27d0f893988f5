//! Audit payloads: field diffs and the change-event record persisted with
//! every audited write.

use alloc::string::{String, ToString};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::IndexMap;
use crate::errors::Error;
use crate::mutation::ColumnMap;
use crate::value::{ToValue, Value};

/// Old and new value of a changed field.
///
/// Delete snapshots carry no new value; `New` is then left out of the JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiffElem {
    /// Value before the change.
    pub old: Value,
    /// Value after the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

impl DiffElem {
    /// An update entry.
    #[must_use]
    pub fn changed(old: Value, new: Value) -> Self {
        Self {
            old,
            new: Some(new),
        }
    }

    /// A delete snapshot entry.
    #[must_use]
    pub fn removed(old: Value) -> Self {
        Self { old, new: None }
    }
}

/// Changed fields keyed by logical field name, in field declaration order.
pub type DiffMap = IndexMap<String, DiffElem>;

/// Encodes a diff as the JSON text stored in [`DataChangeEvent::change_set`].
///
/// # Errors
///
/// * `Json` - If a value cannot be represented as JSON.
pub fn encode_change_set(diff: &DiffMap) -> Result<String, Error> {
    Ok(serde_json::to_string(diff)?)
}

/// One row of the change-tracking table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataChangeEvent {
    /// Table of the written row.
    pub table_name: String,
    /// Primary key values of the row, see [`PrimaryKey::row_id`](crate::PrimaryKey::row_id).
    #[serde(rename = "RowId")]
    pub row_id: String,
    /// When the change happened.
    pub event_time: DateTime<Utc>,
    /// Free-form origin of the change.
    pub event_source: String,
    /// JSON encoded [`DiffMap`].
    pub change_set: String,
}

impl DataChangeEvent {
    /// Column map for inserting the record into the change-tracking table.
    #[must_use]
    pub fn to_column_map(&self) -> ColumnMap {
        let mut columns = ColumnMap::default();
        columns.insert("TableName".to_string(), self.table_name.to_value());
        columns.insert("RowId".to_string(), self.row_id.to_value());
        columns.insert("EventTime".to_string(), self.event_time.to_value());
        columns.insert("EventSource".to_string(), self.event_source.to_value());
        columns.insert("ChangeSet".to_string(), self.change_set.to_value());
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_diff_elem_json() {
        let mut diff = DiffMap::default();
        let name = DiffElem::changed("a".to_value(), "b".to_value());
        diff.insert("Name".into(), name);
        diff.insert("Age".into(), DiffElem::removed(4i64.to_value()));
        assert_eq!(
            encode_change_set(&diff).unwrap(),
            r#"{"Name":{"Old":"a","New":"b"},"Age":{"Old":4}}"#
        );
    }

    #[test]
    fn test_changed_to_null() {
        let elem = DiffElem::changed(Some(1i32).to_value(), None::<i32>.to_value());
        assert_eq!(
            serde_json::to_string(&elem).unwrap(),
            r#"{"Old":1,"New":null}"#
        );
    }

    #[test]
    fn test_event_columns() {
        let event = DataChangeEvent {
            table_name: "Users".into(),
            row_id: "7".into(),
            event_time: DateTime::<Utc>::default(),
            event_source: "api".into(),
            change_set: "{}".into(),
        };
        let columns = event.to_column_map();
        let names: Vec<_> = columns.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            [
                "TableName",
                "RowId",
                "EventTime",
                "EventSource",
                "ChangeSet",
            ]
        );
        assert_eq!(columns["RowId"], "7".to_value());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["RowId"], "7");
        assert_eq!(json["EventTime"], "1970-01-01T00:00:00Z");
    }
}
