//! Asynchronous widgets: media, file, gallery, post picker.
//!
//! These render from whatever resolution state the session currently
//! holds. An id the registry cannot resolve renders as "unresolved" with
//! the raw id visible — it never blocks editing or saving.

use bform_render::{Action, Control, FieldTarget, Node};
use bform_schema::{Direction, FieldSchema, Value};

use crate::{FieldWidget, RenderEnv, asset_id, id_list, labeled};

pub struct MediaWidget;

impl FieldWidget for MediaWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        env: &RenderEnv<'_>,
    ) -> Node {
        let asset = asset_id(value).map(|id| env.lookup.asset_view(target, id));
        let has_value = asset.is_some();
        let mut body = vec![Node::Control {
            target: target.clone(),
            control: Control::MediaPicker {
                asset,
                allowed_types: vec!["image".to_owned()],
            },
        }];
        body.push(picker_buttons(target, has_value, "Select Image", "Change Image"));
        labeled(schema, body)
    }
}

pub struct FileWidget;

impl FieldWidget for FileWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        env: &RenderEnv<'_>,
    ) -> Node {
        let asset = asset_id(value).map(|id| env.lookup.asset_view(target, id));
        let has_value = asset.is_some();
        let mut body = vec![Node::Control {
            target: target.clone(),
            control: Control::FilePicker {
                asset,
                allowed_types: schema.allowed_types.clone(),
            },
        }];
        body.push(picker_buttons(target, has_value, "Select File", "Change File"));
        labeled(schema, body)
    }
}

fn picker_buttons(target: &FieldTarget, has_value: bool, select: &str, change: &str) -> Node {
    let mut buttons = vec![Node::button(
        if has_value { change } else { select },
        Action::OpenAssetPicker {
            target: target.clone(),
            multiple: false,
        },
    )];
    if has_value {
        buttons.push(Node::Button {
            label: "Remove".to_owned(),
            action: Action::ClearAsset {
                target: target.clone(),
            },
            enabled: true,
            destructive: true,
        });
    }
    Node::group(buttons)
}

pub struct GalleryWidget;

impl FieldWidget for GalleryWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        env: &RenderEnv<'_>,
    ) -> Node {
        let ids = id_list(value);
        let count = ids.len();
        let mut body = Vec::new();

        for (index, id) in ids.iter().enumerate() {
            let view = env.lookup.asset_view(target, *id);
            let mut item = vec![Node::Thumbnail { id: *id, view }];
            item.push(Node::Button {
                label: "Move up".to_owned(),
                action: Action::GalleryMove {
                    target: target.clone(),
                    index,
                    direction: Direction::Up,
                },
                enabled: index > 0,
                destructive: false,
            });
            item.push(Node::Button {
                label: "Move down".to_owned(),
                action: Action::GalleryMove {
                    target: target.clone(),
                    index,
                    direction: Direction::Down,
                },
                enabled: index + 1 < count,
                destructive: false,
            });
            item.push(Node::Button {
                label: "Remove".to_owned(),
                action: Action::GalleryRemove {
                    target: target.clone(),
                    index,
                },
                enabled: true,
                destructive: true,
            });
            body.push(Node::group(item));
        }

        body.push(Node::button(
            if count > 0 {
                "Edit Gallery"
            } else {
                "Select Images"
            },
            Action::OpenAssetPicker {
                target: target.clone(),
                multiple: true,
            },
        ));
        labeled(schema, body)
    }
}

pub struct PostObjectWidget;

impl FieldWidget for PostObjectWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        env: &RenderEnv<'_>,
    ) -> Node {
        let selected = asset_id(value).map(|id| env.lookup.post_view(target, id));
        let search = env.lookup.post_search(target);
        let mut body = vec![Node::Control {
            target: target.clone(),
            control: Control::PostPicker {
                selected: selected.clone(),
                query: search.query,
                results: search.results,
                searching: search.searching,
                kinds: schema.post_kinds.clone(),
            },
        }];
        if selected.is_some() {
            body.push(Node::group(vec![Node::Button {
                label: "Remove".to_owned(),
                action: Action::ClearAsset {
                    target: target.clone(),
                },
                enabled: true,
                destructive: true,
            }]));
        }
        labeled(schema, body)
    }
}
