//! Numeric widgets: plain number input and range slider.

use bform_render::{Control, FieldTarget, Node};
use bform_schema::{FieldSchema, Value};

use crate::{FieldWidget, RenderEnv, labeled};

pub struct NumberWidget;

impl FieldWidget for NumberWidget {
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
                control: Control::NumberInput {
                    value: value.as_number().unwrap_or(0.0),
                    min: schema.min,
                    max: schema.max,
                    step: schema.step.unwrap_or(1.0),
                },
            }],
        )
    }
}

pub struct RangeWidget;

impl FieldWidget for RangeWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        _env: &RenderEnv<'_>,
    ) -> Node {
        let min = schema.min.unwrap_or(0.0);
        let max = schema.max.unwrap_or(100.0);
        let raw = value.as_number().unwrap_or(min);
        labeled(
            schema,
            vec![Node::Control {
                target: target.clone(),
                control: Control::Slider {
                    value: raw.clamp(min, max),
                    min,
                    max,
                    step: schema.step.unwrap_or(1.0),
                },
            }],
        )
    }
}
