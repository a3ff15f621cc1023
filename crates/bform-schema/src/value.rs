//! The value model shared by every store and renderer.
//!
//! [`Value`] is a closed enum covering everything a field can hold: scalars,
//! ordered lists (gallery ids, multi-select choices), and repeater rows.
//! It serializes untagged, so persisted JSON looks exactly like the data it
//! carries (`"Hello"`, `42`, `[5, 7, 2]`, `[{"_rowId": "...", ...}]`).
//!
//! Value maps use `BTreeMap` so encode order is deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::row::Row;

/// One instance's live data: field id → current value.
pub type ValueMap = BTreeMap<String, Value>;

/// A field value.
///
/// Untagged serde: arrays whose elements are objects decode as [`Rows`],
/// all other arrays as [`List`]. An empty array decodes as `Rows(vec![])`;
/// use [`Value::as_list`] / [`Value::as_rows`] at use sites where the
/// schema disambiguates.
///
/// [`Rows`]: Value::Rows
/// [`List`]: Value::List
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent/cleared value.
    Null,
    /// Checkbox and toggle state.
    Bool(bool),
    /// Numeric input, range position, asset id.
    Number(f64),
    /// Text-ish content, including opaque formatted text.
    Text(String),
    /// Repeater rows, in authoritative order.
    Rows(Vec<Row>),
    /// Ordered scalar list (gallery ids, multi-select values).
    List(Vec<Value>),
}

impl Value {
    /// Empty text value.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// True when the value is `Null`, an empty string, or an empty
    /// list/row set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Rows(rows) => rows.is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Borrow as text, if textual.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as a number, coercing numeric text ("42") as persisted by
    /// legacy form posts.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Borrow as a boolean. Legacy checkbox posts store `"1"` / `""`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) => Some(s == "1" || s == "true"),
            Self::Number(n) => Some(*n != 0.0),
            _ => None,
        }
    }

    /// View as an ordered list. An empty row set counts as an empty list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            Self::Rows(rows) if rows.is_empty() => Some(&[]),
            _ => None,
        }
    }

    /// View as repeater rows. An empty list counts as an empty row set.
    #[must_use]
    pub fn as_rows(&self) -> Option<&[Row]> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::List(items) if items.is_empty() => Some(&[]),
            _ => None,
        }
    }

    /// Take ownership as rows, coercing an empty list.
    #[must_use]
    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::List(items) if items.is_empty() => Some(Vec::new()),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Merge `partial` into `target`, replacing existing keys.
///
/// The merge is applied in one pass before any reader can observe the map
/// again; callers on the UI event loop therefore never see a half-applied
/// update.
pub fn merge(target: &mut ValueMap, partial: ValueMap) {
    for (key, value) in partial {
        target.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_round_trip_untagged() {
        for (json, value) in [
            ("\"hi\"", Value::text("hi")),
            ("true", Value::Bool(true)),
            ("4.5", Value::Number(4.5)),
            ("null", Value::Null),
        ] {
            let decoded: Value = serde_json::from_str(json).unwrap();
            assert_eq!(decoded, value);
            let encoded = serde_json::to_string(&value).unwrap();
            let redecoded: Value = serde_json::from_str(&encoded).unwrap();
            assert_eq!(redecoded, value);
        }
    }

    #[test]
    fn scalar_array_decodes_as_list() {
        let decoded: Value = serde_json::from_str("[5, 7, 2]").unwrap();
        let Value::List(items) = decoded else {
            panic!("expected list");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(items[1], Value::Number(7.0));
    }

    #[test]
    fn object_array_decodes_as_rows() {
        let decoded: Value =
            serde_json::from_str(r#"[{"_rowId": "r1", "_width": 50, "title": "a"}]"#).unwrap();
        let rows = decoded.as_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "r1");
        assert_eq!(rows[0].values.get("title"), Some(&Value::text("a")));
    }

    #[test]
    fn empty_array_coerces_both_ways() {
        let decoded: Value = serde_json::from_str("[]").unwrap();
        assert_eq!(decoded.as_list(), Some(&[][..]));
        assert!(decoded.as_rows().unwrap().is_empty());
    }

    #[test]
    fn numeric_text_coerces() {
        assert_eq!(Value::text("42").as_number(), Some(42.0));
        assert_eq!(Value::text("nope").as_number(), None);
        assert_eq!(Value::text("1").as_bool(), Some(true));
        assert_eq!(Value::text("").as_bool(), Some(false));
    }

    #[test]
    fn merge_replaces_and_keeps() {
        let mut target = ValueMap::from([
            ("a".to_owned(), Value::text("old")),
            ("b".to_owned(), Value::Number(1.0)),
        ]);
        merge(
            &mut target,
            ValueMap::from([
                ("a".to_owned(), Value::text("new")),
                ("c".to_owned(), Value::Bool(true)),
            ]),
        );
        assert_eq!(target.get("a"), Some(&Value::text("new")));
        assert_eq!(target.get("b"), Some(&Value::Number(1.0)));
        assert_eq!(target.get("c"), Some(&Value::Bool(true)));
    }

    #[test]
    fn is_empty_covers_shapes() {
        assert!(Value::Null.is_empty());
        assert!(Value::text("").is_empty());
        assert!(Value::List(vec![]).is_empty());
        assert!(!Value::Bool(false).is_empty());
        assert!(!Value::Number(0.0).is_empty());
    }
}
