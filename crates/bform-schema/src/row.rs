//! Repeater rows.
//!
//! A row is a value map keyed by sub-field id plus two engine-owned keys
//! that serialize alongside the data: `_rowId` (stable identity, assigned
//! once, persists across reorders) and `_width` (display share). Legacy
//! data may lack `_rowId`; ids are assigned lazily on first decode and the
//! assignment must trigger a re-save.

use serde::{Deserialize, Serialize};

use crate::field::FieldWidth;
use crate::value::{Value, ValueMap};

/// Direction for row (and gallery item) reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

/// Where a fresh row lands relative to its anchor index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertPosition {
    Before,
    After,
}

/// One repeater row: engine keys + the sub-field value map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    /// Stable row identity. Empty only for legacy rows that predate ids;
    /// [`ensure_row_ids`] fills those in.
    #[serde(rename = "_rowId", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Display width share within the repeater.
    #[serde(rename = "_width", default)]
    pub width: FieldWidth,

    /// Sub-field id → value.
    #[serde(flatten)]
    pub values: ValueMap,
}

impl Row {
    /// A row with the given id and full width.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            width: FieldWidth::Full,
            values: ValueMap::new(),
        }
    }

    /// Look up one sub-field value.
    #[must_use]
    pub fn get(&self, sub_field: &str) -> Option<&Value> {
        self.values.get(sub_field)
    }

    /// Merge one sub-field value; other keys are untouched.
    pub fn set(&mut self, sub_field: impl Into<String>, value: Value) {
        self.values.insert(sub_field.into(), value);
    }
}

/// Assign ids to rows that lack one. Returns `true` when any row changed,
/// in which case the caller must persist the rows again.
pub fn ensure_row_ids(rows: &mut [Row], r#gen: &mut RowIdGen) -> bool {
    let mut changed = false;
    for row in rows.iter_mut() {
        if row.id.is_empty() {
            row.id = r#gen.next_id();
            changed = true;
        }
    }
    changed
}

/// Generator for stable row ids.
///
/// Ids embed a per-instance seed and a monotonically increasing counter;
/// the seed keeps ids from two editing sessions of the same document from
/// colliding when rows are merged by a later save.
#[derive(Debug, Clone)]
pub struct RowIdGen {
    seed: String,
    counter: u64,
}

impl RowIdGen {
    /// A generator seeded with an instance-unique string (the driver
    /// typically passes a session timestamp).
    #[must_use]
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            counter: 0,
        }
    }

    /// Produce the next id.
    pub fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("row_{}_{}", self.seed, self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_serializes_engine_keys() {
        let mut row = Row::new("r7");
        row.width = FieldWidth::Half;
        row.set("title", Value::text("hello"));

        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"_rowId\":\"r7\""));
        assert!(json.contains("\"_width\":50"));
        assert!(json.contains("\"title\":\"hello\""));

        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn legacy_row_without_id_decodes() {
        let row: Row = serde_json::from_str(r#"{"title": "a", "count": 3}"#).unwrap();
        assert!(row.id.is_empty());
        assert_eq!(row.width, FieldWidth::Full);
        assert_eq!(row.get("count"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn ensure_row_ids_fills_gaps_only() {
        let mut rows = vec![Row::new("keep"), Row::default(), Row::default()];
        let mut r#gen = RowIdGen::new("s1");
        assert!(ensure_row_ids(&mut rows, &mut r#gen));
        assert_eq!(rows[0].id, "keep");
        assert_eq!(rows[1].id, "row_s1_1");
        assert_eq!(rows[2].id, "row_s1_2");

        // Second pass is a no-op.
        assert!(!ensure_row_ids(&mut rows, &mut r#gen));
    }

    #[test]
    fn nested_values_survive_round_trip() {
        let mut row = Row::new("outer");
        row.set(
            "gallery",
            Value::List(vec![Value::Number(5.0), Value::Number(7.0)]),
        );
        let json = serde_json::to_string(&row).unwrap();
        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
