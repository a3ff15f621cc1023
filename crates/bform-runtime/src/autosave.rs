//! Auto-save coordinator.
//!
//! Observes field changes, debounces, and hands the session one flush
//! containing every dirty field once the input goes quiet. The state
//! machine keeps the contract tight:
//!
//! - N changes inside one debounce window produce exactly one flush;
//! - at most one flush is in flight per instance (FIFO — a new flush
//!   cannot start until the previous commit is acknowledged);
//! - the indicator runs `Idle → Pending → Saved(until) → Idle`, with the
//!   saved state auto-clearing after a fixed display window.
//!
//! Time is caller-supplied milliseconds; nothing here reads a clock.

use ahash::AHashSet;

/// What the chrome shows about the auto-save cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Idle,
    /// A change was observed; a flush is scheduled or in flight.
    Pending,
    /// Last flush committed; clears at the stored deadline.
    Saved { until: u64 },
}

/// Debounced flush scheduler for one instance.
#[derive(Debug)]
pub struct Autosave {
    debounce_ms: u64,
    display_ms: u64,
    /// Root field ids changed since the last flush was taken.
    dirty: AHashSet<String>,
    /// When the debounce window expires, if armed.
    deadline: Option<u64>,
    in_flight: bool,
    indicator: Indicator,
}

impl Autosave {
    #[must_use]
    pub fn new(debounce_ms: u64, display_ms: u64) -> Self {
        Self {
            debounce_ms,
            display_ms,
            dirty: AHashSet::new(),
            deadline: None,
            in_flight: false,
            indicator: Indicator::Idle,
        }
    }

    /// Record one observed change. Restarts the debounce window and
    /// returns the delay until the (new) deadline so the caller can arm
    /// its timer.
    pub fn note_change(&mut self, field: impl Into<String>, now: u64) -> u64 {
        self.dirty.insert(field.into());
        self.indicator = Indicator::Pending;
        self.deadline = Some(now + self.debounce_ms);
        self.debounce_ms
    }

    /// Take the dirty set if the window expired and no flush is in
    /// flight. The caller reads current values for the returned fields at
    /// this moment — not at event time — so rapid edits coalesce.
    pub fn take_flush(&mut self, now: u64) -> Option<Vec<String>> {
        match self.deadline {
            Some(deadline) if now >= deadline && !self.in_flight => {
                self.deadline = None;
                self.in_flight = true;
                let mut fields: Vec<String> = self.dirty.drain().collect();
                fields.sort();
                Some(fields)
            }
            _ => None,
        }
    }

    /// The previous flush was committed.
    pub fn commit_done(&mut self, now: u64) {
        self.in_flight = false;
        // Changes that arrived mid-flight keep the indicator pending; the
        // re-armed deadline will flush them.
        if self.dirty.is_empty() && self.deadline.is_none() {
            self.indicator = Indicator::Saved {
                until: now + self.display_ms,
            };
        }
    }

    /// Advance the indicator; returns `true` when its display changed.
    pub fn tick(&mut self, now: u64) -> bool {
        if let Indicator::Saved { until } = self.indicator {
            if now >= until {
                self.indicator = Indicator::Idle;
                return true;
            }
        }
        false
    }

    /// Delay until the next point this coordinator wants a tick, if any.
    #[must_use]
    pub fn next_wake(&self, now: u64) -> Option<u64> {
        let mut wake: Option<u64> = None;
        if !self.in_flight {
            if let Some(deadline) = self.deadline {
                wake = Some(deadline.saturating_sub(now));
            }
        }
        if let Indicator::Saved { until } = self.indicator {
            let delay = until.saturating_sub(now);
            wake = Some(wake.map_or(delay, |w| w.min(delay)));
        }
        wake
    }

    #[must_use]
    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        !self.dirty.is_empty()
    }
}
