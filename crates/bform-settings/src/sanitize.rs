//! Per-type sanitization of submitted values.
//!
//! Runs between decoding and the snapshot save. Sanitization never
//! fails: a value that cannot be coerced degrades to the field's
//! effective default, numbers clamp and snap, unknown choice values and
//! unknown fields are dropped. Formatted-text and code values pass
//! through opaque — markup policy belongs to the host.

use bform_schema::{FieldSchema, FieldType, Row, Value, ValueMap};

/// Sanitize a decoded submission against its field schemas.
///
/// Only declared fields survive. Checkbox/toggle fields absent from the
/// submission come out `false` (an unchecked box posts nothing).
#[must_use]
pub fn sanitize(fields: &[FieldSchema], input: &ValueMap) -> ValueMap {
    let mut out = ValueMap::new();
    for schema in fields {
        let posted = input.get(&schema.id);
        match (posted, schema.field_type) {
            (None, FieldType::Checkbox | FieldType::Toggle) => {
                out.insert(schema.id.clone(), Value::Bool(false));
            }
            (None, _) => {}
            (Some(value), _) => {
                out.insert(schema.id.clone(), sanitize_value(schema, value));
            }
        }
    }
    out
}

fn sanitize_value(schema: &FieldSchema, value: &Value) -> Value {
    match schema.field_type {
        FieldType::Number | FieldType::Range => match value.as_number() {
            Some(n) => Value::Number(snap(schema, n)),
            None => schema.effective_default(),
        },
        FieldType::Checkbox | FieldType::Toggle => {
            Value::Bool(value.as_bool().unwrap_or(false))
        }
        FieldType::Radio | FieldType::Select => match value.as_text() {
            Some(text) if text.is_empty() || schema.options.contains(text) => value.clone(),
            _ => schema.effective_default(),
        },
        FieldType::ButtonGroup | FieldType::EnhancedSelect => {
            if schema.multiple {
                let items: Vec<Value> = list_items(value)
                    .into_iter()
                    .filter(|v| {
                        v.as_text().is_some_and(|text| schema.options.contains(text))
                    })
                    .collect();
                Value::List(items)
            } else {
                match value.as_text() {
                    Some(text) if text.is_empty() || schema.options.contains(text) => {
                        value.clone()
                    }
                    _ => schema.effective_default(),
                }
            }
        }
        FieldType::Color => match value.as_text() {
            Some(text) if is_hex_color(text) => value.clone(),
            Some(text) if text.is_empty() => Value::text(""),
            _ => schema.effective_default(),
        },
        FieldType::Media | FieldType::File | FieldType::PostObject => {
            match value.as_number().filter(|n| *n >= 1.0) {
                Some(id) => Value::Number(id.trunc()),
                None => Value::text(""),
            }
        }
        FieldType::Gallery => {
            let ids: Vec<Value> = list_items(value)
                .into_iter()
                .filter_map(|v| v.as_number())
                .filter(|n| *n >= 1.0)
                .map(|n| Value::Number(n.trunc()))
                .collect();
            Value::List(ids)
        }
        FieldType::Repeater => {
            let mut rows: Vec<Row> = value
                .as_rows()
                .map(|rows| rows.iter().map(|row| sanitize_row(schema, row)).collect())
                .unwrap_or_default();
            if let Some(max) = schema.max_rows() {
                rows.truncate(max);
            }
            Value::Rows(rows)
        }
        FieldType::Text
        | FieldType::Textarea
        | FieldType::RichText
        | FieldType::Code => match value.as_text() {
            Some(_) => value.clone(),
            None => schema.effective_default(),
        },
    }
}

fn sanitize_row(schema: &FieldSchema, row: &Row) -> Row {
    let mut clean = Row {
        id: row.id.clone(),
        width: row.width,
        values: ValueMap::new(),
    };
    for sub in &schema.fields {
        match (row.get(&sub.id), sub.field_type) {
            (None, FieldType::Checkbox | FieldType::Toggle) => {
                clean.set(sub.id.clone(), Value::Bool(false));
            }
            (None, _) => {}
            (Some(value), _) => {
                clean.set(sub.id.clone(), sanitize_value(sub, value));
            }
        }
    }
    clean
}

fn list_items(value: &Value) -> Vec<Value> {
    match value {
        Value::List(items) => items.clone(),
        Value::Text(s) if !s.is_empty() => vec![Value::text(s.clone())],
        _ => Vec::new(),
    }
}

/// Clamp into `[min, max]` and snap onto the step grid.
fn snap(schema: &FieldSchema, n: f64) -> f64 {
    let mut v = n;
    if let Some(step) = schema.step.filter(|s| *s > 0.0) {
        v = (v / step).round() * step;
    }
    if let Some(min) = schema.min {
        v = v.max(min);
    }
    if let Some(max) = schema.max {
        v = v.min(max);
    }
    v
}

fn is_hex_color(text: &str) -> bool {
    let Some(hex) = text.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(schema: FieldSchema, value: Value) -> Option<Value> {
        let id = schema.id.clone();
        let input = ValueMap::from([(id.clone(), value)]);
        sanitize(&[schema], &input).remove(&id)
    }

    #[test]
    fn numbers_clamp_and_snap() {
        let schema = FieldSchema::new("n", FieldType::Range).with_range(0.0, 10.0, 2.0);
        assert_eq!(one(schema.clone(), Value::text("7")), Some(Value::Number(8.0)));
        assert_eq!(one(schema.clone(), Value::Number(99.0)), Some(Value::Number(10.0)));
        assert_eq!(one(schema.clone(), Value::Number(-5.0)), Some(Value::Number(0.0)));
        assert_eq!(one(schema, Value::text("junk")), Some(Value::Number(0.0)));
    }

    #[test]
    fn unknown_choice_degrades_to_default() {
        let schema = FieldSchema::new("s", FieldType::Select)
            .with_options([("a", "A"), ("b", "B")])
            .with_default("a".into());
        assert_eq!(one(schema.clone(), Value::text("b")), Some(Value::text("b")));
        assert_eq!(one(schema, Value::text("zzz")), Some(Value::text("a")));
    }

    #[test]
    fn multi_select_filters_and_keeps_order() {
        let schema = FieldSchema::new("m", FieldType::EnhancedSelect)
            .with_multiple()
            .with_options([("a", "A"), ("b", "B"), ("c", "C")]);
        let input = Value::List(vec![
            Value::text("c"),
            Value::text("nope"),
            Value::text("a"),
        ]);
        assert_eq!(
            one(schema, input),
            Some(Value::List(vec![Value::text("c"), Value::text("a")]))
        );
    }

    #[test]
    fn absent_checkbox_becomes_false() {
        let fields = vec![FieldSchema::new("flag", FieldType::Checkbox)];
        let out = sanitize(&fields, &ValueMap::new());
        assert_eq!(out.get("flag"), Some(&Value::Bool(false)));
    }

    #[test]
    fn colors_validate_hex() {
        let schema = FieldSchema::new("c", FieldType::Color).with_default("#000000".into());
        assert_eq!(
            one(schema.clone(), Value::text("#A1b2C3")),
            Some(Value::text("#A1b2C3"))
        );
        assert_eq!(one(schema.clone(), Value::text("red")), Some(Value::text("#000000")));
        assert_eq!(one(schema, Value::text("#12")), Some(Value::text("#000000")));
    }

    #[test]
    fn asset_ids_normalize() {
        let schema = FieldSchema::new("img", FieldType::Media);
        assert_eq!(one(schema.clone(), Value::text("42")), Some(Value::Number(42.0)));
        assert_eq!(one(schema.clone(), Value::text("")), Some(Value::text("")));
        assert_eq!(one(schema, Value::text("-3")), Some(Value::text("")));
    }

    #[test]
    fn gallery_drops_non_ids() {
        let schema = FieldSchema::new("g", FieldType::Gallery);
        let input = Value::List(vec![
            Value::text("5"),
            Value::text("x"),
            Value::Number(0.0),
            Value::Number(7.0),
        ]);
        assert_eq!(
            one(schema, input),
            Some(Value::List(vec![Value::Number(5.0), Value::Number(7.0)]))
        );
    }

    #[test]
    fn repeater_rows_sanitize_recursively_and_clip_to_max() {
        let schema = FieldSchema::new("rep", FieldType::Repeater)
            .with_row_bounds(0, 2)
            .with_sub_fields([
                FieldSchema::new("count", FieldType::Number).with_range(0.0, 5.0, 1.0),
                FieldSchema::new("on", FieldType::Toggle),
            ]);
        let mut rows = Vec::new();
        for i in 0..3 {
            let mut row = Row::new(format!("r{i}"));
            row.set("count", Value::text("99"));
            row.set("ignored", Value::text("dropped"));
            rows.push(row);
        }
        let out = one(schema, Value::Rows(rows)).unwrap();
        let rows = out.as_rows().unwrap();
        assert_eq!(rows.len(), 2, "clipped to max");
        assert_eq!(rows[0].get("count"), Some(&Value::Number(5.0)));
        assert_eq!(rows[0].get("on"), Some(&Value::Bool(false)));
        assert_eq!(rows[0].get("ignored"), None, "undeclared sub-field dropped");
        assert_eq!(rows[0].id, "r0", "row identity survives");
    }

    #[test]
    fn undeclared_fields_are_dropped() {
        let fields = vec![FieldSchema::new("keep", FieldType::Text)];
        let input = ValueMap::from([
            ("keep".to_owned(), Value::text("v")),
            ("ghost".to_owned(), Value::text("x")),
        ]);
        let out = sanitize(&fields, &input);
        assert_eq!(out.len(), 1);
        assert!(out.contains_key("keep"));
    }
}
