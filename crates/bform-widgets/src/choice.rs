//! Choice widgets: radio, checkbox, toggle, button group, selects.
//!
//! All of them iterate the schema's options in insertion order — the
//! schema's order is the display order everywhere.

use bform_render::{Control, FieldTarget, Node};
use bform_schema::{FieldSchema, Value};

use crate::{FieldWidget, RenderEnv, display_text, labeled, option_pairs, selected_values};

pub struct RadioWidget;

impl FieldWidget for RadioWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        _env: &RenderEnv<'_>,
    ) -> Node {
        labeled(
            schema,
            vec![Node::Control {
                target: target.clone(),
                control: Control::RadioGroup {
                    selected: display_text(value),
                    options: option_pairs(schema),
                },
            }],
        )
    }
}

pub struct CheckboxWidget;

impl FieldWidget for CheckboxWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        _env: &RenderEnv<'_>,
    ) -> Node {
        // The checkbox renders its own inline label; the outer label is
        // omitted when a checkbox-specific one is declared.
        let inline = schema
            .checkbox_label
            .clone()
            .unwrap_or_else(|| schema.label.clone());
        let control = Node::Control {
            target: target.clone(),
            control: Control::Checkbox {
                checked: value.as_bool().unwrap_or(false),
                label: inline,
            },
        };
        let mut children = vec![control];
        if let Some(help) = schema.help.as_ref().or(schema.description.as_ref()) {
            children.push(Node::Help(help.clone()));
        }
        Node::group(children)
    }
}

pub struct ToggleWidget;

impl FieldWidget for ToggleWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        _env: &RenderEnv<'_>,
    ) -> Node {
        labeled(
            schema,
            vec![Node::Control {
                target: target.clone(),
                control: Control::Toggle {
                    checked: value.as_bool().unwrap_or(false),
                },
            }],
        )
    }
}

pub struct ButtonGroupWidget;

impl FieldWidget for ButtonGroupWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        _env: &RenderEnv<'_>,
    ) -> Node {
        labeled(
            schema,
            vec![Node::Control {
                target: target.clone(),
                control: Control::ButtonGroup {
                    selected: selected_values(value),
                    multiple: schema.multiple,
                    options: option_pairs(schema),
                },
            }],
        )
    }
}

pub struct SelectWidget;

impl FieldWidget for SelectWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        _env: &RenderEnv<'_>,
    ) -> Node {
        labeled(
            schema,
            vec![Node::Control {
                target: target.clone(),
                control: Control::Select {
                    selected: display_text(value),
                    options: option_pairs(schema),
                    placeholder: schema.placeholder.clone(),
                },
            }],
        )
    }
}

pub struct EnhancedSelectWidget;

impl FieldWidget for EnhancedSelectWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        _env: &RenderEnv<'_>,
    ) -> Node {
        labeled(
            schema,
            vec![Node::Control {
                target: target.clone(),
                control: Control::FilterSelect {
                    selected: selected_values(value),
                    multiple: schema.multiple,
                    searchable: schema.searchable,
                    options: option_pairs(schema),
                },
            }],
        )
    }
}
