//! Value store and attribute bridge.
//!
//! One [`ValueStore`] is the single source of truth for one block
//! instance: field id → current value. Two persisted encodings coexist for
//! read compatibility:
//!
//! - **per-field** — one storage entry per field id (new block types);
//! - **legacy blob** — one entry holding a JSON-encoded map of all fields.
//!
//! Readers accept both; writers keep the encoding the instance was created
//! with. A malformed blob decodes as an empty map (never an error), but the
//! original raw string is retained and nothing overwrites it until the next
//! explicit serialize.

use bform_schema::registry::AttributeEncoding;
use bform_schema::{FieldSchema, Value, ValueMap, value};

/// A value map in one of its persisted encodings.
#[derive(Debug, Clone, PartialEq)]
pub enum Persisted {
    /// One entry per field id.
    PerField(ValueMap),
    /// A single JSON-encoded map.
    Blob(String),
}

/// The live value map for one block/settings instance.
#[derive(Debug, Clone)]
pub struct ValueStore {
    values: ValueMap,
    encoding: AttributeEncoding,
    /// The blob exactly as loaded, kept for diagnostics and so a malformed
    /// original survives until an explicit save replaces it.
    raw_blob: Option<String>,
    malformed: bool,
}

impl ValueStore {
    /// An empty store that will persist with the given encoding.
    #[must_use]
    pub fn new(encoding: AttributeEncoding) -> Self {
        Self {
            values: ValueMap::new(),
            encoding,
            raw_blob: None,
            malformed: false,
        }
    }

    /// Load a store from persisted data, regardless of which encoding the
    /// instance declares — legacy instances hand blobs to per-field block
    /// types and vice versa during migrations, and both must read.
    #[must_use]
    pub fn load(encoding: AttributeEncoding, persisted: Persisted) -> Self {
        match persisted {
            Persisted::PerField(values) => Self {
                values,
                encoding,
                raw_blob: None,
                malformed: false,
            },
            Persisted::Blob(raw) => {
                let (values, malformed) = match serde_json::from_str::<ValueMap>(&raw) {
                    Ok(map) => (map, false),
                    Err(err) => {
                        tracing::warn!(
                            target: "bform.store",
                            error = %err,
                            "malformed value blob; treating as empty"
                        );
                        (ValueMap::new(), true)
                    }
                };
                Self {
                    values,
                    encoding,
                    raw_blob: Some(raw),
                    malformed,
                }
            }
        }
    }

    /// The stored value for `id`, if any.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.values.get(id)
    }

    /// The stored value for the field, falling back to the schema default
    /// and then the type-appropriate empty value.
    #[must_use]
    pub fn value_or_default(&self, schema: &FieldSchema) -> Value {
        self.values
            .get(&schema.id)
            .cloned()
            .unwrap_or_else(|| schema.effective_default())
    }

    /// Merge one or more field values into the live map.
    ///
    /// The whole partial map is applied before this returns; renderers on
    /// the same event loop never observe a half-applied merge.
    pub fn set(&mut self, partial: ValueMap) {
        value::merge(&mut self.values, partial);
    }

    /// Set one field.
    pub fn set_one(&mut self, id: impl Into<String>, value: Value) {
        self.values.insert(id.into(), value);
    }

    /// Encode the live map in the instance's write encoding.
    ///
    /// This is the explicit-save boundary: a malformed original blob is
    /// replaced only here.
    #[must_use]
    pub fn serialize(&self) -> Persisted {
        match self.encoding {
            AttributeEncoding::PerField => Persisted::PerField(self.values.clone()),
            AttributeEncoding::LegacyBlob => {
                let raw = serde_json::to_string(&self.values)
                    .unwrap_or_else(|_| String::from("{}"));
                Persisted::Blob(raw)
            }
        }
    }

    #[must_use]
    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    #[must_use]
    pub fn encoding(&self) -> AttributeEncoding {
        self.encoding
    }

    /// The blob string exactly as loaded, when this instance loaded from
    /// one.
    #[must_use]
    pub fn raw_blob(&self) -> Option<&str> {
        self.raw_blob.as_deref()
    }

    /// Whether the loaded blob failed to decode.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        self.malformed
    }
}
