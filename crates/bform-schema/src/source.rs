//! Schema-fetch abstraction.
//!
//! Editors do not read the registry directly; they ask a [`SchemaSource`]
//! for a block type's field list. In-process hosts back this with the
//! registry itself; remote hosts back it with an endpoint. Either way the
//! caller sees the same structured failure modes.

use thiserror::Error;

use crate::field::FieldSchema;
use crate::registry::BlockRegistry;

/// Why a schema fetch produced no fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaFetchError {
    /// The block type is not registered.
    #[error("unknown block type `{0}`")]
    NotFound(String),
    /// The registry/endpoint could not be reached at all.
    #[error("schema registry unavailable: {0}")]
    Unavailable(String),
}

/// Supplies the ordered field list for a block type.
pub trait SchemaSource {
    fn block_fields(&self, block_type: &str) -> Result<Vec<FieldSchema>, SchemaFetchError>;
}

impl SchemaSource for BlockRegistry {
    fn block_fields(&self, block_type: &str) -> Result<Vec<FieldSchema>, SchemaFetchError> {
        self.get(block_type)
            .map(|def| def.fields.clone())
            .ok_or_else(|| SchemaFetchError::NotFound(block_type.to_owned()))
    }
}
