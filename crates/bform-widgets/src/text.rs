//! Text-ish widgets: single line, textarea, color, code.

use bform_render::{Control, FieldTarget, Node};
use bform_schema::{FieldSchema, Value};

use crate::{FieldWidget, RenderEnv, display_text, labeled};

pub struct TextWidget;

impl FieldWidget for TextWidget {
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
                control: Control::TextInput {
                    value: display_text(value),
                    placeholder: schema.placeholder.clone(),
                },
            }],
        )
    }
}

pub struct TextareaWidget;

impl FieldWidget for TextareaWidget {
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
                control: Control::TextArea {
                    value: display_text(value),
                    rows: schema.rows.unwrap_or(5),
                    placeholder: schema.placeholder.clone(),
                },
            }],
        )
    }
}

pub struct ColorWidget;

impl FieldWidget for ColorWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        _env: &RenderEnv<'_>,
    ) -> Node {
        let text = display_text(value);
        labeled(
            schema,
            vec![Node::Control {
                target: target.clone(),
                control: Control::ColorInput {
                    value: if text.is_empty() {
                        "#000000".to_owned()
                    } else {
                        text
                    },
                },
            }],
        )
    }
}

pub struct CodeWidget;

impl FieldWidget for CodeWidget {
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
                control: Control::CodeEditor {
                    value: display_text(value),
                    language: schema.language.clone(),
                },
            }],
        )
    }
}
