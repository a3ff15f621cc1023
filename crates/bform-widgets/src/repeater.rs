//! Repeater widget.
//!
//! Renders the ordered rows with their per-row chrome (collapse toggle,
//! move/insert/delete controls, width menu) and recurses through the
//! widget set for each sub-field. Mutation all happens in the session;
//! this widget only encodes which operations are currently allowed
//! (buttons disabled at min/max/boundaries).

use bform_render::{Action, FieldTarget, Node};
use bform_schema::{Direction, FieldSchema, FieldWidth, InsertPosition, Row, Value};

use crate::{FieldWidget, RenderEnv, labeled};

pub struct RepeaterWidget;

impl FieldWidget for RepeaterWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        env: &RenderEnv<'_>,
    ) -> Node {
        let empty: [Row; 0] = [];
        let rows = value.as_rows().unwrap_or(&empty);
        let count = rows.len();
        let min = schema.min_rows();
        let max = schema.max_rows();
        let at_max = max.is_some_and(|m| count >= m);
        let at_min = count <= min;
        let armed = env.lookup.remove_armed(&schema.id);

        let mut body = Vec::with_capacity(count + 3);
        body.push(Node::Caption(match max {
            Some(max) => format!("{count} / {max} rows"),
            None => format!("{count} rows"),
        }));

        let _ = target;
        for (index, row) in rows.iter().enumerate() {
            body.push(self.render_row(schema, row, index, count, at_max, at_min, armed, env));
        }

        body.push(Node::Button {
            label: "Add Row".to_owned(),
            action: Action::AddRow {
                field: schema.id.clone(),
            },
            enabled: !at_max,
            destructive: false,
        });
        if count < min {
            body.push(Node::Caption(format!("Minimum {min} rows required")));
        }
        labeled(schema, body)
    }
}

impl RepeaterWidget {
    #[allow(clippy::too_many_arguments)]
    fn render_row(
        &self,
        schema: &FieldSchema,
        row: &Row,
        index: usize,
        count: usize,
        at_max: bool,
        at_min: bool,
        armed: Option<usize>,
        env: &RenderEnv<'_>,
    ) -> Node {
        let field = schema.id.clone();
        let collapsed = env.lookup.collapsed(&field, index);
        let mut children = vec![self.row_header(&field, index, count, at_max, at_min, armed, row)];

        if !collapsed {
            for sub in &schema.fields {
                let value = row
                    .get(&sub.id)
                    .cloned()
                    .unwrap_or_else(|| sub.effective_default());
                let sub_target = FieldTarget::row_field(field.clone(), index, sub.id.clone());
                children.push(Node::Group {
                    width: sub.width,
                    children: vec![env.widgets.render_field(sub, &value, &sub_target, env)],
                });
            }
        }

        Node::RowPanel {
            field,
            index,
            row_id: row.id.clone(),
            width: row.width,
            collapsed,
            children,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn row_header(
        &self,
        field: &str,
        index: usize,
        count: usize,
        at_max: bool,
        at_min: bool,
        armed: Option<usize>,
        row: &Row,
    ) -> Node {
        let mut header = vec![
            Node::Caption(format!("Row {}", index + 1)),
            Node::button(
                "Toggle",
                Action::ToggleCollapse {
                    field: field.to_owned(),
                    index,
                },
            ),
            Node::Button {
                label: "Move up".to_owned(),
                action: Action::MoveRow {
                    field: field.to_owned(),
                    index,
                    direction: Direction::Up,
                },
                enabled: index > 0,
                destructive: false,
            },
            Node::Button {
                label: "Move down".to_owned(),
                action: Action::MoveRow {
                    field: field.to_owned(),
                    index,
                    direction: Direction::Down,
                },
                enabled: index + 1 < count,
                destructive: false,
            },
            Node::Button {
                label: "Add Before".to_owned(),
                action: Action::InsertRow {
                    field: field.to_owned(),
                    index,
                    position: InsertPosition::Before,
                },
                enabled: !at_max,
                destructive: false,
            },
            Node::Button {
                label: "Add After".to_owned(),
                action: Action::InsertRow {
                    field: field.to_owned(),
                    index,
                    position: InsertPosition::After,
                },
                enabled: !at_max,
                destructive: false,
            },
        ];

        for width in FieldWidth::ALL {
            header.push(Node::Button {
                label: format!("{}%", width.percent()),
                action: Action::SetRowWidth {
                    field: field.to_owned(),
                    index,
                    width,
                },
                enabled: width != row.width,
                destructive: false,
            });
        }

        if armed == Some(index) {
            header.push(Node::Confirm {
                prompt: "Are you sure?".to_owned(),
                action: Action::ConfirmRemoveRow {
                    field: field.to_owned(),
                    index,
                },
            });
        } else {
            header.push(Node::Button {
                label: "Delete".to_owned(),
                action: Action::RequestRemoveRow {
                    field: field.to_owned(),
                    index,
                },
                enabled: !at_min,
                destructive: true,
            });
        }
        Node::group(header)
    }
}
