//! Block registry.
//!
//! The registry is an explicit object built once at startup and passed by
//! reference to anything that needs a lookup. There is deliberately no
//! process-global registry: two registries in the same process never
//! interfere.

use ahash::AHashMap;

use crate::error::SchemaError;
use crate::field::{FieldSchema, validate_fields};

/// How a block instance persists its value map.
///
/// The choice is fixed per block type — one configuration point instead of
/// scattered conditionals. Readers handle both encodings regardless; see
/// the value store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeEncoding {
    /// One storage key per field id. New block types use this.
    #[default]
    PerField,
    /// A single storage key holding a JSON-encoded map of all fields.
    /// Kept for blocks created before per-field attributes existed.
    LegacyBlob,
}

/// One registered block type.
#[derive(Debug, Clone)]
pub struct BlockDef {
    /// Registry key, e.g. `"hero"` or `"faq"`.
    pub block_type: String,
    /// Human-readable title.
    pub title: String,
    /// Ordered field schemas.
    pub fields: Vec<FieldSchema>,
    pub encoding: AttributeEncoding,
    /// Whether rendering this block may embed another document that itself
    /// contains blocks. Embedding blocks consume render depth.
    pub embeds_documents: bool,
}

impl BlockDef {
    /// A per-field-encoded block with the given type, title, and fields.
    #[must_use]
    pub fn new(
        block_type: impl Into<String>,
        title: impl Into<String>,
        fields: Vec<FieldSchema>,
    ) -> Self {
        Self {
            block_type: block_type.into(),
            title: title.into(),
            fields,
            encoding: AttributeEncoding::PerField,
            embeds_documents: false,
        }
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: AttributeEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    #[must_use]
    pub fn embedding_documents(mut self) -> Self {
        self.embeds_documents = true;
        self
    }
}

/// Lookup table from block type to definition, preserving registration
/// order for listings.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    blocks: AHashMap<String, BlockDef>,
    order: Vec<String>,
}

impl BlockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block definition, validating its field schemas first.
    ///
    /// Fails without side effects on duplicate type or invalid schemas.
    pub fn register(&mut self, def: BlockDef) -> Result<(), SchemaError> {
        if self.blocks.contains_key(&def.block_type) {
            return Err(SchemaError::DuplicateBlock(def.block_type));
        }
        validate_fields(&def.block_type, &def.fields)?;
        self.order.push(def.block_type.clone());
        self.blocks.insert(def.block_type.clone(), def);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, block_type: &str) -> Option<&BlockDef> {
        self.blocks.get(block_type)
    }

    #[must_use]
    pub fn contains(&self, block_type: &str) -> bool {
        self.blocks.contains_key(block_type)
    }

    /// Definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockDef> {
        self.order.iter().filter_map(|k| self.blocks.get(k))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;

    fn hero() -> BlockDef {
        BlockDef::new(
            "hero",
            "Hero",
            vec![FieldSchema::new("title", FieldType::Text)],
        )
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = BlockRegistry::new();
        registry.register(hero()).unwrap();
        assert!(registry.contains("hero"));
        assert_eq!(registry.get("hero").unwrap().title, "Hero");
        assert!(registry.get("faq").is_none());
    }

    #[test]
    fn duplicate_block_rejected() {
        let mut registry = BlockRegistry::new();
        registry.register(hero()).unwrap();
        assert_eq!(
            registry.register(hero()),
            Err(SchemaError::DuplicateBlock("hero".to_owned()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn invalid_schema_rejected_without_side_effects() {
        let mut registry = BlockRegistry::new();
        let bad = BlockDef::new(
            "bad",
            "Bad",
            vec![
                FieldSchema::new("x", FieldType::Text),
                FieldSchema::new("x", FieldType::Text),
            ],
        );
        assert!(registry.register(bad).is_err());
        assert!(!registry.contains("bad"));
        assert!(registry.is_empty());
    }

    #[test]
    fn iter_preserves_registration_order() {
        let mut registry = BlockRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register(BlockDef::new(name, name, Vec::new()))
                .unwrap();
        }
        let order: Vec<&str> = registry.iter().map(|d| d.block_type.as_str()).collect();
        assert_eq!(order, ["zeta", "alpha", "mid"]);
    }
}
