//! Request generations for supersede-able lookups.
//!
//! An in-flight asset lookup superseded by a newer one for the same slot
//! must have its late result ignored: last-request-wins, not
//! last-response-wins. Each request takes a generation from a global
//! counter and records it per slot key; a completion is current only if
//! its generation still matches the slot's record.

use ahash::AHashMap;

/// Generation table keyed by slot (target key, optionally qualified by
/// asset id for per-item lookups like gallery thumbnails).
#[derive(Debug, Default)]
pub struct LookupTable {
    next: u64,
    current: AHashMap<String, u64>,
}

impl LookupTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request for `key`, superseding any outstanding one.
    /// Returns the new generation to carry on the effect.
    pub fn begin(&mut self, key: impl Into<String>) -> u64 {
        self.next += 1;
        self.current.insert(key.into(), self.next);
        self.next
    }

    /// Whether a completion with `generation` is still the latest request
    /// for `key`.
    #[must_use]
    pub fn is_current(&self, key: &str, generation: u64) -> bool {
        self.current.get(key) == Some(&generation)
    }

    /// Drop the record for `key` (slot cleared).
    pub fn forget(&mut self, key: &str) {
        self.current.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_request_supersedes_older() {
        let mut table = LookupTable::new();
        let g1 = table.begin("img");
        let g2 = table.begin("img");
        assert!(g2 > g1);
        assert!(!table.is_current("img", g1), "stale result must be dropped");
        assert!(table.is_current("img", g2));
    }

    #[test]
    fn keys_are_independent() {
        let mut table = LookupTable::new();
        let a = table.begin("a");
        let b = table.begin("b");
        assert!(table.is_current("a", a));
        assert!(table.is_current("b", b));
    }

    #[test]
    fn forget_clears_slot() {
        let mut table = LookupTable::new();
        let g = table.begin("img");
        table.forget("img");
        assert!(!table.is_current("img", g));
    }
}
