#![forbid(unsafe_code)]

//! Core vocabulary for blockform: field schemas, the value model, and the
//! block registry.
//!
//! A [`FieldSchema`] declares one form input (type, label, default,
//! constraints, layout width, optional sub-fields). Schemas are authored
//! once at startup, registered per block type in a [`BlockRegistry`], and
//! are read-only for the process lifetime. Everything downstream — the
//! widget renderers, the repeater engine, the value store — consumes this
//! vocabulary and never extends it.

pub mod error;
pub mod field;
pub mod registry;
pub mod row;
pub mod source;
pub mod value;

pub use error::SchemaError;
pub use field::{FieldSchema, FieldType, FieldWidth, Options};
pub use registry::{AttributeEncoding, BlockDef, BlockRegistry};
pub use row::{Direction, InsertPosition, Row, RowIdGen};
pub use source::{SchemaFetchError, SchemaSource};
pub use value::{Value, ValueMap};
