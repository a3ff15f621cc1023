//! Form submission decoding.
//!
//! Settings pages post flat `name=value` pairs with bracket names:
//!
//! ```text
//! opts[site_title]            scalar field
//! opts[tags][]                multi-select item (order = post order)
//! opts[links][0][label]       repeater row sub-field
//! opts[links][0][_rowId]      engine-owned row keys post like sub-fields
//! ```
//!
//! [`decode_form`] turns those into a nested [`ValueMap`]: scalars as
//! text, multi-selects as ordered lists, repeaters as ordered row lists.
//! Values stay textual here; the sanitizer coerces them per schema.

use std::collections::BTreeMap;

use bform_schema::{FieldWidth, Row, Value, ValueMap};
use thiserror::Error;

/// A submission that cannot be decoded. Nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The name does not parse as `prefix[...]...` brackets.
    #[error("malformed field name `{0}`")]
    MalformedName(String),
    /// A repeater index segment is not a number.
    #[error("malformed row index in `{0}`")]
    MalformedIndex(String),
}

/// One parsed name path.
enum Path {
    Scalar(String),
    ListItem(String),
    RowField {
        field: String,
        index: usize,
        sub_field: String,
    },
}

/// Decode posted pairs under `prefix` into a nested value map.
///
/// Pair order is preserved for list items and repeater rows (rows are
/// ordered by their index segment; gaps are closed).
pub fn decode_form(
    prefix: &str,
    pairs: &[(String, String)],
) -> Result<ValueMap, SubmissionError> {
    let mut scalars = ValueMap::new();
    let mut lists: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    let mut rows: BTreeMap<String, BTreeMap<usize, Row>> = BTreeMap::new();
    for (name, value) in pairs {
        match parse_name(prefix, name)? {
            Path::Scalar(field) => {
                scalars.insert(field, Value::text(value.clone()));
            }
            Path::ListItem(field) => {
                lists.entry(field).or_default().push(Value::text(value.clone()));
            }
            Path::RowField {
                field,
                index,
                sub_field,
            } => {
                let row = rows
                    .entry(field)
                    .or_default()
                    .entry(index)
                    .or_insert_with(Row::default);
                match sub_field.as_str() {
                    "_rowId" => row.id = value.clone(),
                    "_width" => {
                        row.width = value
                            .parse::<u8>()
                            .ok()
                            .and_then(FieldWidth::from_percent)
                            .unwrap_or_default();
                    }
                    _ => row.set(sub_field, Value::text(value.clone())),
                }
            }
        }
    }

    let mut out = scalars;
    for (field, items) in lists {
        out.insert(field, Value::List(items));
    }
    for (field, indexed) in rows {
        // BTreeMap ordering closes index gaps while keeping row order.
        let ordered: Vec<Row> = indexed.into_values().collect();
        out.insert(field, Value::Rows(ordered));
    }
    Ok(out)
}

fn parse_name(prefix: &str, name: &str) -> Result<Path, SubmissionError> {
    let rest = name
        .strip_prefix(prefix)
        .ok_or_else(|| SubmissionError::MalformedName(name.to_owned()))?;
    let segments = parse_brackets(rest).ok_or_else(|| {
        SubmissionError::MalformedName(name.to_owned())
    })?;
    match segments.as_slice() {
        [field] if !field.is_empty() => Ok(Path::Scalar(field.clone())),
        [field, empty] if empty.is_empty() && !field.is_empty() => {
            Ok(Path::ListItem(field.clone()))
        }
        [field, index, sub_field] if !field.is_empty() && !sub_field.is_empty() => {
            let index: usize = index
                .parse()
                .map_err(|_| SubmissionError::MalformedIndex(name.to_owned()))?;
            Ok(Path::RowField {
                field: field.clone(),
                index,
                sub_field: sub_field.clone(),
            })
        }
        _ => Err(SubmissionError::MalformedName(name.to_owned())),
    }
}

/// Split `[a][0][b]` into its segments; `None` on anything else.
fn parse_brackets(raw: &str) -> Option<Vec<String>> {
    let mut segments = Vec::new();
    let mut rest = raw;
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        segments.push(inner[..close].to_owned());
        rest = &inner[close + 1..];
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}
