#![forbid(unsafe_code)]

//! Field widgets.
//!
//! One [`FieldWidget`] implementation per field type, registered in a
//! [`WidgetSet`] keyed by [`FieldType`]. Dispatch goes through the map —
//! host contexts never switch on the type tag themselves, so the type
//! list exists in exactly one place. A type with no registered widget
//! renders as a visible diagnostic naming the type and siblings continue;
//! nothing throws.
//!
//! Widgets are pure: `(schema, current value, environment) → Node`. All
//! session state a widget needs to display (asset resolution, collapse
//! flags, armed confirmations, post search) comes in through
//! [`ViewLookup`].

pub mod choice;
pub mod media;
pub mod number;
pub mod repeater;
pub mod rich_text;
pub mod text;

use ahash::AHashMap;
use bform_backend::PostSummary;
use bform_render::{
    AssetView, Diagnostic, FieldTarget, MountId, Node, PostView, RenderContext,
};
use bform_schema::{FieldSchema, FieldType, FieldWidth, Value};
use bform_store::ValueStore;

/// Session-held display state, queried by widgets while rendering.
///
/// Every method has a neutral default so plain rendering (tests, static
/// previews) needs no session at all — see [`NullLookup`].
pub trait ViewLookup {
    /// Resolution state for an asset referenced by `target`.
    fn asset_view(&self, _target: &FieldTarget, id: u64) -> AssetView {
        AssetView::Unresolved(id)
    }

    /// Resolution state for a referenced post.
    fn post_view(&self, _target: &FieldTarget, id: u64) -> PostView {
        PostView::Unresolved(id)
    }

    /// Live post search state for a post picker.
    fn post_search(&self, _target: &FieldTarget) -> PostSearchView {
        PostSearchView::default()
    }

    /// Collapse flag for a repeater row position.
    fn collapsed(&self, _field: &str, _index: usize) -> bool {
        false
    }

    /// The row index with an armed delete confirmation, if any.
    fn remove_armed(&self, _field: &str) -> Option<usize> {
        None
    }

    /// The mount identity for an embedded-editor slot. Sessions key row
    /// sub-fields by stable row id so mounts survive reorders; the default
    /// keys by position.
    fn mount_id(&self, target: &FieldTarget) -> MountId {
        MountId::for_target(target)
    }
}

/// Live state of one post picker's search box.
#[derive(Debug, Clone, Default)]
pub struct PostSearchView {
    pub query: String,
    pub results: Vec<PostSummary>,
    pub searching: bool,
}

/// A [`ViewLookup`] with no session behind it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLookup;

impl ViewLookup for NullLookup {}

/// Everything a widget render call can see.
pub struct RenderEnv<'a> {
    pub context: RenderContext,
    pub widgets: &'a WidgetSet,
    pub lookup: &'a dyn ViewLookup,
}

/// One field type's renderer.
pub trait FieldWidget {
    fn render(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        env: &RenderEnv<'_>,
    ) -> Node;
}

/// Type → widget map.
pub struct WidgetSet {
    widgets: AHashMap<FieldType, Box<dyn FieldWidget>>,
}

impl WidgetSet {
    /// An empty set; every render produces an unsupported-type diagnostic.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            widgets: AHashMap::new(),
        }
    }

    /// The full built-in set.
    #[must_use]
    pub fn standard() -> Self {
        let mut set = Self::empty();
        set.register(FieldType::Text, text::TextWidget);
        set.register(FieldType::Textarea, text::TextareaWidget);
        set.register(FieldType::Color, text::ColorWidget);
        set.register(FieldType::Code, text::CodeWidget);
        set.register(FieldType::Number, number::NumberWidget);
        set.register(FieldType::Range, number::RangeWidget);
        set.register(FieldType::Radio, choice::RadioWidget);
        set.register(FieldType::Checkbox, choice::CheckboxWidget);
        set.register(FieldType::Toggle, choice::ToggleWidget);
        set.register(FieldType::ButtonGroup, choice::ButtonGroupWidget);
        set.register(FieldType::Select, choice::SelectWidget);
        set.register(FieldType::EnhancedSelect, choice::EnhancedSelectWidget);
        set.register(FieldType::Media, media::MediaWidget);
        set.register(FieldType::File, media::FileWidget);
        set.register(FieldType::Gallery, media::GalleryWidget);
        set.register(FieldType::PostObject, media::PostObjectWidget);
        set.register(FieldType::RichText, rich_text::RichTextWidget);
        set.register(FieldType::Repeater, repeater::RepeaterWidget);
        set
    }

    pub fn register(&mut self, field_type: FieldType, widget: impl FieldWidget + 'static) {
        self.widgets.insert(field_type, Box::new(widget));
    }

    /// Render one field, dispatching by type. Missing widget ⇒ inline
    /// diagnostic, never an error.
    #[must_use]
    pub fn render_field(
        &self,
        schema: &FieldSchema,
        value: &Value,
        target: &FieldTarget,
        env: &RenderEnv<'_>,
    ) -> Node {
        match self.widgets.get(&schema.field_type) {
            Some(widget) => widget.render(schema, value, target, env),
            None => {
                tracing::warn!(
                    target: "bform.widgets",
                    field = %schema.id,
                    field_type = %schema.field_type,
                    "no widget registered"
                );
                Node::Diagnostic(Diagnostic::UnsupportedType {
                    field: schema.id.clone(),
                    type_name: schema.field_type.name().to_owned(),
                })
            }
        }
    }
}

impl std::fmt::Debug for WidgetSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetSet")
            .field("types", &self.widgets.len())
            .finish()
    }
}

/// Render a whole field list against a value store.
///
/// Each field resolves its value through the store's default chain and is
/// wrapped in a width group; repeaters always span the full row, matching
/// the settings page and editor layouts.
#[must_use]
pub fn render_form(
    fields: &[FieldSchema],
    store: &ValueStore,
    context: RenderContext,
    widgets: &WidgetSet,
    lookup: &dyn ViewLookup,
) -> Node {
    let env = RenderEnv {
        context,
        widgets,
        lookup,
    };
    let children = fields
        .iter()
        .map(|schema| {
            let value = store.value_or_default(schema);
            let target = FieldTarget::field(schema.id.clone());
            let width = if schema.field_type == FieldType::Repeater {
                FieldWidth::Full
            } else {
                schema.width
            };
            Node::Group {
                width,
                children: vec![widgets.render_field(schema, &value, &target, &env)],
            }
        })
        .collect();
    Node::Section {
        title: None,
        children,
    }
}

// ── Shared widget helpers ───────────────────────────────────────────────

/// Wrap a control with its label/help chrome.
pub(crate) fn labeled(schema: &FieldSchema, body: Vec<Node>) -> Node {
    let mut children = Vec::with_capacity(body.len() + 2);
    if !schema.label.is_empty() {
        children.push(Node::Label(schema.label.clone()));
    }
    children.extend(body);
    if let Some(help) = schema.help.as_ref().or(schema.description.as_ref()) {
        children.push(Node::Help(help.clone()));
    }
    Node::group(children)
}

/// Display text for a scalar value.
pub(crate) fn display_text(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Number(n) => {
            if n.fract() == 0.0 {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        Value::Bool(b) => if *b { "1" } else { "" }.to_owned(),
        _ => String::new(),
    }
}

/// A referenced asset id (`None` for empty/zero).
pub(crate) fn asset_id(value: &Value) -> Option<u64> {
    let n = value.as_number()?;
    if n >= 1.0 { Some(n as u64) } else { None }
}

/// An ordered id list (gallery values).
pub(crate) fn id_list(value: &Value) -> Vec<u64> {
    value
        .as_list()
        .map(|items| items.iter().filter_map(asset_id).collect())
        .unwrap_or_default()
}

/// Ordered selected values for multi-capable choice fields.
pub(crate) fn selected_values(value: &Value) -> Vec<String> {
    match value {
        Value::List(items) => items
            .iter()
            .filter_map(|v| v.as_text().map(str::to_owned))
            .collect(),
        Value::Text(s) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Options as owned pairs, in declaration order.
pub(crate) fn option_pairs(schema: &FieldSchema) -> Vec<(String, String)> {
    schema
        .options
        .iter()
        .map(|(v, l)| (v.to_owned(), l.to_owned()))
        .collect()
}
