#![forbid(unsafe_code)]

//! The render vocabulary shared by every host context.
//!
//! Widgets produce a [`Node`] tree instead of drawing to a concrete
//! surface; the editor canvas, the modal overlay, and the settings page
//! each map the same tree onto their own chrome. Input flows the other
//! way: a host turns interaction with a [`Control`] into a set-value
//! message for the control's [`FieldTarget`], and a [`Button`] press into
//! its [`Action`]. Presentation differs per [`RenderContext`]; the value
//! contract never does.
//!
//! [`Button`]: Node::Button

use bform_backend::{AssetMeta, PostSummary};
use bform_schema::{Direction, FieldWidth, InsertPosition};

/// Per-block-instance view mode. Session state, never part of the value
/// map; persisted client-side keyed by (document, block position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    #[default]
    Edit,
    Preview,
}

impl ViewMode {
    /// The stable string stored client-side.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Preview => "preview",
        }
    }

    /// Parse a stored string; anything unrecognized falls back to `Edit`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "preview" => Self::Preview,
            _ => Self::Edit,
        }
    }
}

/// Which host surface is rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderContext {
    /// The rich block editor surface.
    EditorCanvas,
    /// The modal overlay over the editor.
    Modal,
    /// The classic admin settings page.
    SettingsPage,
}

impl RenderContext {
    /// Whether fields in this context participate in auto-save unless the
    /// schema says otherwise. Modal fields auto-save; the settings page
    /// uses an explicit submit.
    #[must_use]
    pub fn autosaves_by_default(self) -> bool {
        matches!(self, Self::Modal)
    }
}

/// Address of one value slot: a top-level field, or one sub-field of one
/// repeater row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldTarget {
    Field { field: String },
    RowField {
        field: String,
        row: usize,
        sub_field: String,
    },
}

impl FieldTarget {
    #[must_use]
    pub fn field(id: impl Into<String>) -> Self {
        Self::Field { field: id.into() }
    }

    #[must_use]
    pub fn row_field(field: impl Into<String>, row: usize, sub_field: impl Into<String>) -> Self {
        Self::RowField {
            field: field.into(),
            row,
            sub_field: sub_field.into(),
        }
    }

    /// The top-level field id this slot belongs to.
    #[must_use]
    pub fn root(&self) -> &str {
        match self {
            Self::Field { field } | Self::RowField { field, .. } => field,
        }
    }

    /// A stable string key for caches and mount ids, e.g.
    /// `items.2.content`.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Field { field } => field.clone(),
            Self::RowField {
                field,
                row,
                sub_field,
            } => format!("{field}.{row}.{sub_field}"),
        }
    }
}

/// Identity of one embedded formatted-text editor mount.
///
/// The session creates exactly one mount per id and destroys it exactly
/// once; hosts bind the external editor component to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountId(pub String);

impl MountId {
    #[must_use]
    pub fn for_target(target: &FieldTarget) -> Self {
        Self(target.key())
    }
}

/// Resolution state of an asset referenced by id.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetView {
    /// Lookup in flight.
    Loading(u64),
    Resolved(AssetMeta),
    /// The id could not be resolved; the raw id stays visible and saving
    /// is not blocked.
    Unresolved(u64),
}

impl AssetView {
    /// The referenced id, whatever the resolution state.
    #[must_use]
    pub fn id(&self) -> u64 {
        match self {
            Self::Loading(id) | Self::Unresolved(id) => *id,
            Self::Resolved(meta) => meta.id,
        }
    }
}

/// Resolution state of a referenced post.
#[derive(Debug, Clone, PartialEq)]
pub enum PostView {
    Loading(u64),
    Resolved(PostSummary),
    Unresolved(u64),
}

/// A user-triggerable operation carried by a button.
///
/// Every action funnels into the session's single update path; widgets
/// never mutate anything themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetMode(ViewMode),
    AddRow { field: String },
    InsertRow {
        field: String,
        index: usize,
        position: InsertPosition,
    },
    /// Arms the delete confirmation for a row.
    RequestRemoveRow { field: String, index: usize },
    /// Applies an armed delete.
    ConfirmRemoveRow { field: String, index: usize },
    CancelRemoveRow { field: String },
    MoveRow {
        field: String,
        index: usize,
        direction: Direction,
    },
    SetRowWidth {
        field: String,
        index: usize,
        width: FieldWidth,
    },
    ToggleCollapse { field: String, index: usize },
    GalleryMove {
        target: FieldTarget,
        index: usize,
        direction: Direction,
    },
    GalleryRemove { target: FieldTarget, index: usize },
    /// Opens the host's external asset chooser for the slot.
    OpenAssetPicker { target: FieldTarget, multiple: bool },
    ClearAsset { target: FieldTarget },
    PostSearch { target: FieldTarget, query: String },
    SelectPost { target: FieldTarget, id: u64 },
}

/// One concrete input, bound to a value slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    TextInput {
        value: String,
        placeholder: Option<String>,
    },
    TextArea {
        value: String,
        rows: u8,
        placeholder: Option<String>,
    },
    NumberInput {
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
        step: f64,
    },
    Slider {
        value: f64,
        min: f64,
        max: f64,
        step: f64,
    },
    /// Options in declaration order.
    RadioGroup {
        selected: String,
        options: Vec<(String, String)>,
    },
    Checkbox { checked: bool, label: String },
    Toggle { checked: bool },
    ButtonGroup {
        selected: Vec<String>,
        multiple: bool,
        options: Vec<(String, String)>,
    },
    ColorInput { value: String },
    Select {
        selected: String,
        options: Vec<(String, String)>,
        placeholder: Option<String>,
    },
    /// Enhanced select: free-text filtering; when `multiple`, `selected`
    /// keeps selection order.
    FilterSelect {
        selected: Vec<String>,
        multiple: bool,
        searchable: bool,
        options: Vec<(String, String)>,
    },
    MediaPicker {
        asset: Option<AssetView>,
        allowed_types: Vec<String>,
    },
    FilePicker {
        asset: Option<AssetView>,
        allowed_types: Vec<String>,
    },
    PostPicker {
        selected: Option<PostView>,
        query: String,
        results: Vec<PostSummary>,
        searching: bool,
        kinds: Vec<String>,
    },
    /// Opaque formatted text bound to an embedded editor mount.
    RichText { mount: MountId, content: String },
    CodeEditor {
        value: String,
        language: Option<String>,
    },
}

/// Inline error/diagnostic content. Diagnostics replace one field's
/// control, never the whole form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    UnsupportedType { field: String, type_name: String },
    SchemaUnavailable { message: String },
    PreviewFailed { message: String },
    EmbedDepthExceeded { block_type: String, depth: u8 },
}

/// Transient status shown in the chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Loading,
    SavePending,
    Saved,
    Error,
}

/// One element of the host-agnostic UI tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Width-sharing wrapper; children flow within the row.
    Group {
        width: FieldWidth,
        children: Vec<Node>,
    },
    /// Context chrome (modal body, settings tab, block frame).
    Section {
        title: Option<String>,
        children: Vec<Node>,
    },
    Label(String),
    Help(String),
    /// Small secondary text, e.g. the repeater's `"2 / 3"` counter.
    Caption(String),
    Control {
        target: FieldTarget,
        control: Control,
    },
    Button {
        label: String,
        action: Action,
        enabled: bool,
        destructive: bool,
    },
    /// An armed confirmation: the host shows the prompt and fires the
    /// action only on explicit confirm.
    Confirm { prompt: String, action: Action },
    /// One repeater row's box.
    RowPanel {
        field: String,
        index: usize,
        row_id: String,
        width: FieldWidth,
        collapsed: bool,
        children: Vec<Node>,
    },
    /// One gallery thumbnail; identity tracks the asset id, not the
    /// position.
    Thumbnail { id: u64, view: AssetView },
    Diagnostic(Diagnostic),
    Status { kind: StatusKind, text: String },
    /// Server-rendered preview markup, opaque to the engine.
    Preview { markup: String },
    /// Explicit empty state (empty preview output, empty gallery).
    Empty { message: String },
}

impl Node {
    /// Convenience: a full-width group.
    #[must_use]
    pub fn group(children: Vec<Node>) -> Self {
        Self::Group {
            width: FieldWidth::Full,
            children,
        }
    }

    #[must_use]
    pub fn button(label: impl Into<String>, action: Action) -> Self {
        Self::Button {
            label: label.into(),
            action,
            enabled: true,
            destructive: false,
        }
    }

    /// Depth-first traversal over this node and all descendants.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        match self {
            Self::Group { children, .. }
            | Self::Section { children, .. }
            | Self::RowPanel { children, .. } => {
                for child in children {
                    child.visit(f);
                }
            }
            _ => {}
        }
    }

    /// Collect every node matching the predicate.
    pub fn find_all<'a>(&'a self, pred: impl Fn(&Node) -> bool) -> Vec<&'a Node> {
        let mut hits = Vec::new();
        self.visit(&mut |node| {
            if pred(node) {
                hits.push(node);
            }
        });
        hits
    }

    /// Every control binding in the tree, in render order.
    #[must_use]
    pub fn bindings(&self) -> Vec<&FieldTarget> {
        let mut out = Vec::new();
        self.visit(&mut |node| {
            if let Node::Control { target, .. } = node {
                out.push(target);
            }
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_keys_are_stable() {
        assert_eq!(FieldTarget::field("title").key(), "title");
        assert_eq!(
            FieldTarget::row_field("items", 2, "content").key(),
            "items.2.content"
        );
        assert_eq!(FieldTarget::row_field("items", 2, "content").root(), "items");
    }

    #[test]
    fn visit_walks_nested_groups() {
        let tree = Node::group(vec![
            Node::Label("a".into()),
            Node::Section {
                title: None,
                children: vec![Node::Label("b".into()), Node::Caption("c".into())],
            },
        ]);
        let mut labels = 0;
        tree.visit(&mut |n| {
            if matches!(n, Node::Label(_)) {
                labels += 1;
            }
        });
        assert_eq!(labels, 2);
        assert_eq!(tree.find_all(|n| matches!(n, Node::Caption(_))).len(), 1);
    }

    #[test]
    fn bindings_in_render_order() {
        let tree = Node::group(vec![
            Node::Control {
                target: FieldTarget::field("one"),
                control: Control::Toggle { checked: false },
            },
            Node::Control {
                target: FieldTarget::field("two"),
                control: Control::Toggle { checked: true },
            },
        ]);
        let keys: Vec<String> = tree.bindings().iter().map(|t| t.key()).collect();
        assert_eq!(keys, ["one", "two"]);
    }

    #[test]
    fn asset_view_exposes_id() {
        assert_eq!(AssetView::Loading(9).id(), 9);
        assert_eq!(AssetView::Unresolved(4).id(), 4);
    }
}
