#![forbid(unsafe_code)]

//! blockform — a schema-driven block form engine.
//!
//! Field schemas are declared server-side, once, per block type; a single
//! generic editor renders the form for any of them in three host contexts
//! (editor canvas, modal overlay, settings page), synchronized through a
//! per-instance value store with debounced auto-save. The settings
//! variant snapshots every save into a versioned store with an active
//! pointer.
//!
//! This crate re-exports the workspace members; depend on it for the
//! whole engine or on individual `bform-*` crates for a slice.
//!
//! ```
//! use bform::prelude::*;
//!
//! let mut registry = BlockRegistry::new();
//! registry
//!     .register(BlockDef::new(
//!         "hero",
//!         "Hero",
//!         vec![
//!             FieldSchema::new("title", FieldType::Text).with_label("Title"),
//!             FieldSchema::new("content", FieldType::RichText).with_label("Content"),
//!         ],
//!     ))
//!     .unwrap();
//! assert!(registry.contains("hero"));
//! ```

pub use bform_backend as backend;
pub use bform_render as render;
pub use bform_runtime as runtime;
pub use bform_schema as schema;
pub use bform_settings as settings;
pub use bform_store as store;
pub use bform_versions as versions;
pub use bform_widgets as widgets;

/// The commonly-needed surface in one import.
pub mod prelude {
    pub use bform_backend::{AssetMeta, AssetSource, OptionStore, PreviewSource, StateStore};
    pub use bform_render::{
        Action, FieldTarget, Node, RenderContext, ViewMode,
    };
    pub use bform_runtime::{
        BlockSession, Driver, EngineConfig, Msg, SessionOptions,
    };
    pub use bform_schema::{
        BlockDef, BlockRegistry, FieldSchema, FieldType, FieldWidth, Row, SchemaSource, Value,
        ValueMap,
    };
    pub use bform_settings::SettingsSession;
    pub use bform_store::{Persisted, RepeaterState, ValueStore};
    pub use bform_versions::VersionStore;
    pub use bform_widgets::{WidgetSet, render_form};
}
