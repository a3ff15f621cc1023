//! JSON-file client-state store.
//!
//! The browser analog of local storage: one JSON object per file, loaded
//! on open, written through on every mutation. Writes degrade silently
//! (logged at `warn`) because client-side UI state must never fail an
//! interaction; call [`FileStateStore::flush`] where the caller wants the
//! error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{StateStore, StorageError};

/// File-backed [`StateStore`].
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStateStore {
    /// Open a store at `path`, loading existing entries. A missing file
    /// starts empty; a corrupt file starts empty and is overwritten on the
    /// next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!(
                    target: "bform.backend",
                    path = %path.display(),
                    error = %err,
                    "corrupt state file; starting empty"
                );
                BTreeMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, entries })
    }

    /// Persist the current entries, surfacing the error.
    pub fn flush(&self) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(&self.entries)
            .map_err(|err| StorageError::Encoding(err.to_string()))?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    fn write_through(&self) {
        if let Err(err) = self.flush() {
            tracing::warn!(
                target: "bform.backend",
                path = %self.path.display(),
                error = %err,
                "state write failed"
            );
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
        self.write_through();
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.write_through();
        }
    }
}
