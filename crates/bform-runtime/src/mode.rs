//! Preview/edit mode persistence.
//!
//! The mode survives reloads of the same document but must not leak
//! across documents or block positions, so the storage key pairs the
//! document id with the block's position within it.

use bform_backend::StateStore;
use bform_render::ViewMode;

/// The client-state key for one block instance's mode.
#[must_use]
pub fn mode_key(document: &str, position: usize) -> String {
    format!("block_mode_{document}_{position}")
}

/// Read the persisted mode; anything absent or unrecognized is `Edit`.
#[must_use]
pub fn load_mode(state: &dyn StateStore, document: &str, position: usize) -> ViewMode {
    state
        .get(&mode_key(document, position))
        .map(|raw| ViewMode::parse(&raw))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bform_backend::memory::MemoryState;

    #[test]
    fn defaults_to_edit() {
        let state = MemoryState::new();
        assert_eq!(load_mode(&state, "doc1", 0), ViewMode::Edit);
    }

    #[test]
    fn keys_do_not_leak_across_positions_or_documents() {
        let mut state = MemoryState::new();
        state.set(&mode_key("doc1", 0), ViewMode::Preview.as_str());

        assert_eq!(load_mode(&state, "doc1", 0), ViewMode::Preview);
        assert_eq!(load_mode(&state, "doc1", 1), ViewMode::Edit);
        assert_eq!(load_mode(&state, "doc2", 0), ViewMode::Edit);
    }

    #[test]
    fn corrupt_value_falls_back_to_edit() {
        let mut state = MemoryState::new();
        state.set(&mode_key("doc1", 0), "garbled");
        assert_eq!(load_mode(&state, "doc1", 0), ViewMode::Edit);
    }
}
