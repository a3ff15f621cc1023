#![forbid(unsafe_code)]

//! Versioned settings snapshots.
//!
//! Every explicit save of a settings instance creates an immutable,
//! timestamped snapshot of the full value map; exactly one snapshot is
//! "active" via a separate pointer record. Snapshots are never edited in
//! place — the only operations are create, move the pointer, and delete.
//!
//! # Storage layout
//!
//! Three kinds of records in the backing [`OptionStore`], all JSON:
//!
//! ```text
//! {instance}_{timestamp}   one record per snapshot (the value map)
//! {instance}_versions      index: timestamp → {created, author}
//! {instance}_active        the active timestamp
//! ```
//!
//! # Invariants
//!
//! 1. `save` is the only operation that adds a snapshot, and it moves the
//!    pointer to the new timestamp.
//! 2. `restore` moves the pointer only; the snapshot set is untouched.
//! 3. The active snapshot and the sole remaining snapshot can never be
//!    deleted.
//! 4. A dangling pointer (corrupt state) falls back to the greatest
//!    timestamp on read.

use std::collections::BTreeMap;

use bform_backend::{OptionStore, StorageError};
use bform_schema::{Value, ValueMap};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a versioning operation was rejected.
#[derive(Debug, Error)]
pub enum VersionError {
    /// The referenced timestamp has no snapshot.
    #[error("version {0} does not exist")]
    NotFound(i64),
    /// The operation would break a store invariant (delete the active or
    /// sole snapshot).
    #[error("invalid version operation: {0}")]
    InvalidOperation(String),
    /// A snapshot with this timestamp already exists; the caller retries
    /// with a later one.
    #[error("a version with timestamp {0} already exists")]
    DuplicateTimestamp(i64),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("version record corrupt: {0}")]
    Encoding(String),
}

/// Index metadata for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub timestamp: i64,
    /// Human-readable creation time.
    pub created: String,
    /// Who saved it.
    pub author: String,
}

/// Snapshot store for one settings instance.
#[derive(Debug)]
pub struct VersionStore<K> {
    store: K,
    instance: String,
}

impl<K: OptionStore> VersionStore<K> {
    #[must_use]
    pub fn new(store: K, instance: impl Into<String>) -> Self {
        Self {
            store,
            instance: instance.into(),
        }
    }

    fn key(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.instance)
    }

    /// Create a new snapshot from `values` and make it active.
    ///
    /// The timestamp comes from the caller, which must keep it
    /// monotonic; a collision is rejected without side effects.
    pub fn save(
        &mut self,
        values: &ValueMap,
        timestamp: i64,
        author: &str,
    ) -> Result<(), VersionError> {
        let mut versions = self.versions()?;
        if versions.contains_key(&timestamp) {
            return Err(VersionError::DuplicateTimestamp(timestamp));
        }

        let raw = serde_json::to_string(values)
            .map_err(|err| VersionError::Encoding(err.to_string()))?;
        self.store.set(&self.key(&timestamp.to_string()), &raw)?;

        versions.insert(
            timestamp,
            SnapshotMeta {
                timestamp,
                created: format_timestamp(timestamp),
                author: author.to_owned(),
            },
        );
        self.write_versions(&versions)?;
        self.store
            .set(&self.key("active"), &timestamp.to_string())?;
        tracing::debug!(
            target: "bform.versions",
            instance = %self.instance,
            timestamp,
            "snapshot saved"
        );
        Ok(())
    }

    /// Move the active pointer to an existing snapshot. Never creates,
    /// deletes, or mutates snapshot contents.
    pub fn restore(&mut self, timestamp: i64) -> Result<(), VersionError> {
        let versions = self.versions()?;
        if !versions.contains_key(&timestamp) {
            return Err(VersionError::NotFound(timestamp));
        }
        self.store
            .set(&self.key("active"), &timestamp.to_string())?;
        Ok(())
    }

    /// Delete one snapshot. The active snapshot and the only remaining
    /// snapshot are protected.
    pub fn delete(&mut self, timestamp: i64) -> Result<(), VersionError> {
        let mut versions = self.versions()?;
        if !versions.contains_key(&timestamp) {
            return Err(VersionError::NotFound(timestamp));
        }
        if self.active_timestamp()? == Some(timestamp) {
            return Err(VersionError::InvalidOperation(
                "cannot delete the active version".to_owned(),
            ));
        }
        if versions.len() <= 1 {
            return Err(VersionError::InvalidOperation(
                "cannot delete the only version".to_owned(),
            ));
        }
        self.store.delete(&self.key(&timestamp.to_string()))?;
        versions.remove(&timestamp);
        self.write_versions(&versions)?;
        Ok(())
    }

    /// Remove every snapshot except the active one.
    pub fn prune_all_but_active(&mut self) -> Result<(), VersionError> {
        let versions = self.versions()?;
        let Some(active) = self.active_timestamp()? else {
            return Ok(());
        };
        let mut kept = BTreeMap::new();
        for (timestamp, meta) in versions {
            if timestamp == active {
                kept.insert(timestamp, meta);
            } else {
                self.store.delete(&self.key(&timestamp.to_string()))?;
            }
        }
        self.write_versions(&kept)?;
        Ok(())
    }

    /// All snapshot metadata, oldest first.
    pub fn versions(&self) -> Result<BTreeMap<i64, SnapshotMeta>, VersionError> {
        match self.store.get(&self.key("versions"))? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|err| VersionError::Encoding(err.to_string())),
            None => Ok(BTreeMap::new()),
        }
    }

    /// The active timestamp: the pointer record when it references an
    /// existing snapshot, otherwise the greatest timestamp, otherwise
    /// `None`.
    pub fn active_timestamp(&self) -> Result<Option<i64>, VersionError> {
        let versions = self.versions()?;
        if let Some(raw) = self.store.get(&self.key("active"))? {
            if let Ok(timestamp) = raw.trim().parse::<i64>() {
                if versions.contains_key(&timestamp) {
                    return Ok(Some(timestamp));
                }
                tracing::warn!(
                    target: "bform.versions",
                    instance = %self.instance,
                    timestamp,
                    "active pointer dangles; falling back to newest"
                );
            }
        }
        Ok(versions.keys().next_back().copied())
    }

    /// The active snapshot's value map, or an empty map if no snapshots
    /// exist.
    pub fn active_value(&self) -> Result<ValueMap, VersionError> {
        match self.active_timestamp()? {
            Some(timestamp) => self.snapshot_value(timestamp),
            None => Ok(ValueMap::new()),
        }
    }

    /// One snapshot's value map. A missing or corrupt record yields an
    /// empty map — reads never fail the caller's page.
    pub fn snapshot_value(&self, timestamp: i64) -> Result<ValueMap, VersionError> {
        match self.store.get(&self.key(&timestamp.to_string()))? {
            Some(raw) => Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!(
                    target: "bform.versions",
                    timestamp,
                    error = %err,
                    "snapshot corrupt; treating as empty"
                );
                ValueMap::new()
            })),
            None => Ok(ValueMap::new()),
        }
    }

    /// Arbitrary-consumer read: one key from one snapshot (the active one
    /// when `version` is omitted), with a caller-supplied default.
    pub fn option_value(
        &self,
        key: &str,
        default: Value,
        version: Option<i64>,
    ) -> Result<Value, VersionError> {
        let values = match version {
            Some(timestamp) => self.snapshot_value(timestamp)?,
            None => self.active_value()?,
        };
        Ok(values.get(key).cloned().unwrap_or(default))
    }

    #[must_use]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// The backing store (the settings session reaches through for
    /// unrelated records).
    pub fn store_mut(&mut self) -> &mut K {
        &mut self.store
    }

    fn write_versions(&mut self, versions: &BTreeMap<i64, SnapshotMeta>) -> Result<(), VersionError> {
        let raw = serde_json::to_string(versions)
            .map_err(|err| VersionError::Encoding(err.to_string()))?;
        self.store.set(&self.key("versions"), &raw)?;
        Ok(())
    }
}

fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
