//! Formatted-text widget.
//!
//! The value is opaque sanitized markup; the widget never parses it. It
//! renders a control carrying a stable [`MountId`](bform_render::MountId)
//! so the host can bind
//! the embedded editor component; the session guarantees one construct on
//! mount and one destroy on unmount per id.

use bform_render::{Control, FieldTarget, Node};
use bform_schema::{FieldSchema, Value};

use crate::{FieldWidget, RenderEnv, display_text, labeled};

pub struct RichTextWidget;

impl FieldWidget for RichTextWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        env: &RenderEnv<'_>,
    ) -> Node {
        labeled(
            schema,
            vec![Node::Control {
                target: target.clone(),
                control: Control::RichText {
                    mount: env.lookup.mount_id(target),
                    content: display_text(value),
                },
            }],
        )
    }
}
