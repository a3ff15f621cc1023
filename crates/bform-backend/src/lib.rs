#![forbid(unsafe_code)]

//! Host abstraction for blockform.
//!
//! The engine never talks to a content registry, a template renderer, or a
//! persistence layer directly — it goes through the traits here. The
//! driver executes these calls between model updates and feeds results
//! back as messages, so trait methods may block the driver briefly but
//! never run inside `update`.
//!
//! In-memory implementations live in [`memory`]; a JSON-file client-state
//! store (the localStorage analog) lives in [`file`].

pub mod file;
pub mod memory;

use bform_schema::ValueMap;
use thiserror::Error;

/// Resolved display metadata for a media/file asset.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AssetMeta {
    pub id: u64,
    pub url: String,
    pub filename: String,
    pub title: String,
    /// Mime type, e.g. `image/jpeg`. Absent for registries that don't
    /// report one.
    pub mime: Option<String>,
}

/// One result of a post search or post lookup.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PostSummary {
    pub id: u64,
    pub title: String,
    /// Content kind, e.g. `global_block` or `page`.
    pub kind: String,
    pub edit_link: Option<String>,
}

/// Why an asset/post lookup produced no metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetLookupError {
    /// No asset with this id (or it is filtered out by type/kind).
    #[error("asset {0} not found")]
    NotFound(u64),
    /// The registry could not be reached.
    #[error("asset registry unavailable: {0}")]
    Unavailable(String),
}

/// Resolves numeric ids (and free-text post searches) to display metadata.
pub trait AssetSource {
    /// Resolve a media/file asset. `allowed_types` filters by mime: an
    /// entry matches a full mime type (`video/mp4`) or a top-level family
    /// (`image`). Empty means no filter.
    fn media(&self, id: u64, allowed_types: &[String]) -> Result<AssetMeta, AssetLookupError>;

    /// Resolve one post by id, constrained to the given content kinds
    /// (empty = any).
    fn post(&self, id: u64, kinds: &[String]) -> Result<PostSummary, AssetLookupError>;

    /// Free-text post search constrained to content kinds, at most
    /// `limit` results, ordered by title.
    fn search_posts(
        &self,
        query: &str,
        kinds: &[String],
        limit: usize,
    ) -> Result<Vec<PostSummary>, AssetLookupError>;
}

/// Why a preview render produced no markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("preview render failed: {0}")]
pub struct PreviewError(pub String);

/// Renders a block's display template for the current value map.
///
/// `depth` counts document embeddings along the render chain; it is
/// threaded explicitly so nested renders in the same process never share
/// counters.
pub trait PreviewSource {
    fn render(&self, block_type: &str, values: &ValueMap, depth: u8)
    -> Result<String, PreviewError>;
}

impl<F> PreviewSource for F
where
    F: Fn(&str, &ValueMap, u8) -> Result<String, PreviewError>,
{
    fn render(
        &self,
        block_type: &str,
        values: &ValueMap,
        depth: u8,
    ) -> Result<String, PreviewError> {
        self(block_type, values, depth)
    }
}

/// Storage failures for server-persisted records.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding: {0}")]
    Encoding(String),
}

/// Server-persisted key-value records (settings snapshots, pointers).
pub trait OptionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Client-local key-value state (per-viewing-session UI state such as the
/// preview/edit mode). Writes are best-effort: like browser local storage,
/// a failed write degrades silently rather than failing the interaction.
pub trait StateStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}
