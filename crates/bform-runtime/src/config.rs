//! Engine configuration.
//!
//! Policy-as-data: behavior constants live in one serde struct with
//! defaults matching the shipped product, optionally loaded from TOML so
//! hosts can tune without recompiling.

use serde::Deserialize;

/// Tunable engine behavior.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Auto-save debounce window: input silence required before a flush.
    pub debounce_ms: u64,
    /// How long the "saved" indicator stays visible after a commit.
    pub saved_display_ms: u64,
    /// Hard cap on document-embedding render depth.
    pub max_embed_depth: u8,
    /// Minimum query length before a post search fires.
    pub search_min_chars: usize,
    /// Maximum post search results requested.
    pub search_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            saved_display_ms: 2_000,
            max_embed_depth: 3,
            search_min_chars: 2,
            search_limit: 20,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document; absent keys keep their defaults.
    #[cfg(any(feature = "config-toml", test))]
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Load from a TOML file.
    #[cfg(feature = "config-toml")]
    pub fn load(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw).map_err(|err| std::io::Error::other(err.to_string()))
    }
}
