//! Schema validation errors.

use thiserror::Error;

/// Errors raised while validating or registering field schemas.
///
/// Validation runs once at startup, when block definitions are registered.
/// A failed registration never leaves a half-registered block behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two fields in the same scope (top level, or one repeater's
    /// sub-fields) share an id.
    #[error("duplicate field id `{id}` in {scope}")]
    DuplicateFieldId { scope: String, id: String },

    /// A choice field declares the same option value twice.
    #[error("field `{field}` declares option value `{value}` more than once")]
    DuplicateOptionValue { field: String, value: String },

    /// A declared default does not match the field type's value shape.
    #[error("field `{field}` default does not match type `{field_type}`")]
    DefaultShapeMismatch { field: String, field_type: String },

    /// Numeric constraints are inconsistent (min > max, or step <= 0).
    #[error("field `{field}` has invalid constraints: {reason}")]
    InvalidConstraint { field: String, reason: String },

    /// A block type was registered twice.
    #[error("block type `{0}` is already registered")]
    DuplicateBlock(String),
}
