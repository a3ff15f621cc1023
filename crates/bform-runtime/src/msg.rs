//! Messages, commands, and effects.

use bform_backend::{AssetLookupError, AssetMeta, PostSummary, PreviewError};
use bform_render::{Action, FieldTarget, MountId, ViewMode};
use bform_schema::source::SchemaFetchError;
use bform_schema::{FieldSchema, Value, ValueMap};

/// Everything that can change a session's state.
///
/// Messages carrying a `generation` are completions of superseded-able
/// requests; the session drops any whose generation is no longer current
/// (last-request-wins).
#[derive(Debug, Clone)]
pub enum Msg {
    /// Schema fetch completed. `at` is the arrival time in driver-clock
    /// milliseconds.
    SchemaLoaded {
        result: Result<Vec<FieldSchema>, SchemaFetchError>,
        at: u64,
    },
    /// A control reported a new value. `at` is the event time in
    /// driver-clock milliseconds.
    SetValue {
        target: FieldTarget,
        value: Value,
        at: u64,
    },
    /// A button fired.
    Action { action: Action, at: u64 },
    /// The host's asset chooser returned a selection.
    AssetPicked {
        target: FieldTarget,
        ids: Vec<u64>,
        at: u64,
    },
    /// Media/file metadata lookup completed.
    AssetResolved {
        target: FieldTarget,
        id: u64,
        generation: u64,
        result: Result<AssetMeta, AssetLookupError>,
    },
    /// Post lookup completed.
    PostResolved {
        target: FieldTarget,
        id: u64,
        generation: u64,
        result: Result<PostSummary, AssetLookupError>,
    },
    /// Post search completed.
    PostSearchDone {
        target: FieldTarget,
        generation: u64,
        result: Result<Vec<PostSummary>, AssetLookupError>,
    },
    /// Preview render completed.
    PreviewRendered {
        generation: u64,
        result: Result<String, PreviewError>,
    },
    /// The host persisted an auto-save payload.
    PersistDone { at: u64 },
    /// Debounce/indicator timer fired.
    Tick { now: u64 },
}

/// A side effect for the driver to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchSchema { block_type: String },
    LookupMedia {
        target: FieldTarget,
        id: u64,
        allowed_types: Vec<String>,
        generation: u64,
    },
    LookupPost {
        target: FieldTarget,
        id: u64,
        kinds: Vec<String>,
        generation: u64,
    },
    SearchPosts {
        target: FieldTarget,
        query: String,
        kinds: Vec<String>,
        limit: usize,
        generation: u64,
    },
    RenderPreview {
        block_type: String,
        values: ValueMap,
        depth: u8,
        generation: u64,
    },
    /// Construct the embedded formatted-text editor for a mount.
    MountEditor { mount: MountId, content: String },
    /// Tear the embedded editor down. Issued exactly once per mount.
    DestroyEditor { mount: MountId },
    /// Open the host's asset chooser.
    OpenAssetPicker {
        target: FieldTarget,
        multiple: bool,
        allowed_types: Vec<String>,
    },
    /// Commit an auto-save payload to the host's attribute storage.
    /// `flushed_at` stamps the flush.
    PersistAttributes { payload: ValueMap, flushed_at: u64 },
    /// Persist the per-instance view mode client-side.
    PersistMode { key: String, mode: ViewMode },
}

/// Commands returned from `update`: no-op, effects, timers, or batches.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    None,
    /// Execute several commands in order.
    Batch(Vec<Cmd>),
    /// Ask the driver for a tick after the given delay (milliseconds).
    /// The driver keeps at most one pending tick per session.
    Tick(u64),
    Effect(Effect),
}

impl Cmd {
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::None
    }

    #[inline]
    #[must_use]
    pub fn effect(effect: Effect) -> Self {
        Self::Effect(effect)
    }

    /// Collapse a command list: empty → `None`, singleton → the command.
    #[must_use]
    pub fn batch(cmds: Vec<Cmd>) -> Self {
        let mut cmds: Vec<Cmd> = cmds
            .into_iter()
            .filter(|c| !matches!(c, Cmd::None))
            .collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.remove(0),
            _ => Self::Batch(cmds),
        }
    }

    /// Flatten into the effect/tick leaves, in execution order.
    #[must_use]
    pub fn flatten(self) -> Vec<Cmd> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

impl Default for Cmd {
    fn default() -> Self {
        Self::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_collapses() {
        assert_eq!(Cmd::batch(vec![]), Cmd::None);
        assert_eq!(Cmd::batch(vec![Cmd::None, Cmd::None]), Cmd::None);
        assert_eq!(Cmd::batch(vec![Cmd::Tick(5), Cmd::None]), Cmd::Tick(5));
        assert!(matches!(
            Cmd::batch(vec![Cmd::Tick(5), Cmd::Tick(6)]),
            Cmd::Batch(_)
        ));
    }

    #[test]
    fn flatten_preserves_order() {
        let cmd = Cmd::Batch(vec![
            Cmd::Tick(1),
            Cmd::Batch(vec![Cmd::Tick(2), Cmd::None]),
            Cmd::Tick(3),
        ]);
        let leaves = cmd.flatten();
        assert_eq!(leaves, vec![Cmd::Tick(1), Cmd::Tick(2), Cmd::Tick(3)]);
    }
}
