//! In-memory backends for tests, demos, and single-process hosts.

use ahash::AHashMap;

use crate::{
    AssetLookupError, AssetMeta, AssetSource, OptionStore, PostSummary, StateStore, StorageError,
};

/// In-memory asset/post registry.
#[derive(Debug, Default)]
pub struct MemoryAssets {
    media: AHashMap<u64, AssetMeta>,
    posts: Vec<PostSummary>,
    /// When set, every lookup fails as unavailable (for exercising
    /// degraded paths).
    offline: bool,
}

impl MemoryAssets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_media(&mut self, meta: AssetMeta) {
        self.media.insert(meta.id, meta);
    }

    pub fn insert_post(&mut self, post: PostSummary) {
        self.posts.push(post);
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    fn check_online(&self) -> Result<(), AssetLookupError> {
        if self.offline {
            Err(AssetLookupError::Unavailable("offline".to_owned()))
        } else {
            Ok(())
        }
    }
}

fn mime_allowed(mime: Option<&str>, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let Some(mime) = mime else {
        return false;
    };
    allowed.iter().any(|a| {
        mime == a || mime.split('/').next() == Some(a.as_str())
    })
}

impl AssetSource for MemoryAssets {
    fn media(&self, id: u64, allowed_types: &[String]) -> Result<AssetMeta, AssetLookupError> {
        self.check_online()?;
        let meta = self.media.get(&id).ok_or(AssetLookupError::NotFound(id))?;
        if !mime_allowed(meta.mime.as_deref(), allowed_types) {
            return Err(AssetLookupError::NotFound(id));
        }
        Ok(meta.clone())
    }

    fn post(&self, id: u64, kinds: &[String]) -> Result<PostSummary, AssetLookupError> {
        self.check_online()?;
        self.posts
            .iter()
            .find(|p| p.id == id && (kinds.is_empty() || kinds.contains(&p.kind)))
            .cloned()
            .ok_or(AssetLookupError::NotFound(id))
    }

    fn search_posts(
        &self,
        query: &str,
        kinds: &[String],
        limit: usize,
    ) -> Result<Vec<PostSummary>, AssetLookupError> {
        self.check_online()?;
        let needle = query.to_lowercase();
        let mut hits: Vec<PostSummary> = self
            .posts
            .iter()
            .filter(|p| kinds.is_empty() || kinds.contains(&p.kind))
            .filter(|p| needle.is_empty() || p.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.title.cmp(&b.title));
        hits.truncate(limit);
        Ok(hits)
    }
}

/// In-memory server-side option records.
#[derive(Debug, Default)]
pub struct MemoryOptions {
    entries: AHashMap<String, String>,
}

impl MemoryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl OptionStore for MemoryOptions {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// In-memory client-local state.
#[derive(Debug, Default)]
pub struct MemoryState {
    entries: AHashMap<String, String>,
}

impl MemoryState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryState {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}
