//! Synchronous effect driver.
//!
//! The driver is the session's event loop: it executes [`Effect`]s
//! against the backend traits, feeds completions back as [`Msg`]s, and
//! owns the single pending tick per session (which is what makes the
//! auto-save debounce at-most-one-flush). Time is a millisecond counter
//! advanced explicitly, so every schedule is deterministic; interactive
//! hosts advance it with wall-clock deltas.

use bform_backend::{AssetSource, PreviewSource, StateStore};
use bform_render::{Action, FieldTarget, MountId};
use bform_schema::{SchemaSource, Value, ValueMap};

use crate::msg::{Cmd, Effect, Msg};
use crate::session::BlockSession;

/// One embedded-editor lifecycle event, in order of occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountEvent {
    Mounted(MountId),
    Destroyed(MountId),
}

/// An unanswered request to open the host's asset chooser.
#[derive(Debug, Clone, PartialEq)]
pub struct PickerRequest {
    pub target: FieldTarget,
    pub multiple: bool,
    pub allowed_types: Vec<String>,
}

/// Executes effects for one session against concrete backends.
pub struct Driver<S, A, P, K> {
    schema: S,
    assets: A,
    preview: P,
    state: K,
    clock: u64,
    /// Time of the message currently being processed; tick delays are
    /// relative to this, so a handler running late still schedules from
    /// its own timeline.
    logical: u64,
    tick_at: Option<u64>,
    last_poll: Option<web_time::Instant>,
    mount_log: Vec<MountEvent>,
    picker_requests: Vec<PickerRequest>,
    persisted: Vec<(ValueMap, u64)>,
}

impl<S, A, P, K> Driver<S, A, P, K>
where
    S: SchemaSource,
    A: AssetSource,
    P: PreviewSource,
    K: StateStore,
{
    #[must_use]
    pub fn new(schema: S, assets: A, preview: P, state: K) -> Self {
        Self {
            schema,
            assets,
            preview,
            state,
            clock: 0,
            logical: 0,
            tick_at: None,
            last_poll: None,
            mount_log: Vec::new(),
            picker_requests: Vec::new(),
            persisted: Vec::new(),
        }
    }

    #[must_use]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Run the session's startup command.
    pub fn start(&mut self, session: &mut BlockSession) {
        let cmd = session.init();
        self.execute(session, cmd);
    }

    /// Deliver one message and execute whatever it commands.
    pub fn send(&mut self, session: &mut BlockSession, msg: Msg) {
        let prev = self.logical;
        self.logical = match &msg {
            Msg::Tick { now } => *now,
            Msg::SchemaLoaded { at, .. }
            | Msg::SetValue { at, .. }
            | Msg::Action { at, .. }
            | Msg::AssetPicked { at, .. }
            | Msg::PersistDone { at } => *at,
            _ => self.clock,
        };
        let cmd = session.update(msg);
        self.execute(session, cmd);
        self.logical = prev;
    }

    /// Advance the clock, firing due ticks. Each tick is delivered with
    /// its scheduled time, not the (possibly later) clock, so debounce
    /// deadlines observe the order a real timer would produce.
    pub fn advance(&mut self, session: &mut BlockSession, delta_ms: u64) {
        self.clock += delta_ms;
        while let Some(at) = self.tick_at {
            if at > self.clock {
                break;
            }
            self.tick_at = None;
            self.send(session, Msg::Tick { now: at });
        }
    }

    /// Advance by the real time elapsed since the previous poll.
    /// Interactive hosts call this from their event loop; tests use
    /// [`advance`](Self::advance) directly.
    pub fn poll(&mut self, session: &mut BlockSession) {
        let now = web_time::Instant::now();
        let delta = match self.last_poll.replace(now) {
            Some(prev) => now.duration_since(prev).as_millis() as u64,
            None => 0,
        };
        self.advance(session, delta);
    }

    // ── Host-event helpers ──────────────────────────────────────────────

    /// A control reported a new value.
    pub fn set_value(&mut self, session: &mut BlockSession, target: FieldTarget, value: Value) {
        self.send(
            session,
            Msg::SetValue {
                target,
                value,
                at: self.clock,
            },
        );
    }

    /// A button fired.
    pub fn action(&mut self, session: &mut BlockSession, action: Action) {
        self.send(
            session,
            Msg::Action {
                action,
                at: self.clock,
            },
        );
    }

    /// The host's asset chooser returned a selection.
    pub fn pick_assets(&mut self, session: &mut BlockSession, target: FieldTarget, ids: Vec<u64>) {
        self.send(
            session,
            Msg::AssetPicked {
                target,
                ids,
                at: self.clock,
            },
        );
    }

    // ── Observation (hosts and tests) ───────────────────────────────────

    /// Auto-save payloads committed so far, with their flush stamps.
    #[must_use]
    pub fn persisted(&self) -> &[(ValueMap, u64)] {
        &self.persisted
    }

    #[must_use]
    pub fn mount_log(&self) -> &[MountEvent] {
        &self.mount_log
    }

    #[must_use]
    pub fn picker_requests(&self) -> &[PickerRequest] {
        &self.picker_requests
    }

    #[must_use]
    pub fn state(&self) -> &K {
        &self.state
    }

    #[must_use]
    pub fn has_pending_tick(&self) -> bool {
        self.tick_at.is_some()
    }

    // ── Execution ───────────────────────────────────────────────────────

    fn execute(&mut self, session: &mut BlockSession, cmd: Cmd) {
        for leaf in cmd.flatten() {
            match leaf {
                Cmd::Tick(delay) => {
                    let at = self.logical + delay;
                    self.tick_at = Some(self.tick_at.map_or(at, |t| t.min(at)));
                }
                Cmd::Effect(effect) => self.run_effect(session, effect),
                Cmd::None | Cmd::Batch(_) => {}
            }
        }
    }

    fn run_effect(&mut self, session: &mut BlockSession, effect: Effect) {
        match effect {
            Effect::FetchSchema { block_type } => {
                let result = self.schema.block_fields(&block_type);
                let at = self.clock;
                self.send(session, Msg::SchemaLoaded { result, at });
            }
            Effect::LookupMedia {
                target,
                id,
                allowed_types,
                generation,
            } => {
                let result = self.assets.media(id, &allowed_types);
                self.send(
                    session,
                    Msg::AssetResolved {
                        target,
                        id,
                        generation,
                        result,
                    },
                );
            }
            Effect::LookupPost {
                target,
                id,
                kinds,
                generation,
            } => {
                let result = self.assets.post(id, &kinds);
                self.send(
                    session,
                    Msg::PostResolved {
                        target,
                        id,
                        generation,
                        result,
                    },
                );
            }
            Effect::SearchPosts {
                target,
                query,
                kinds,
                limit,
                generation,
            } => {
                let result = self.assets.search_posts(&query, &kinds, limit);
                self.send(
                    session,
                    Msg::PostSearchDone {
                        target,
                        generation,
                        result,
                    },
                );
            }
            Effect::RenderPreview {
                block_type,
                values,
                depth,
                generation,
            } => {
                let result = self.preview.render(&block_type, &values, depth);
                self.send(session, Msg::PreviewRendered { generation, result });
            }
            Effect::MountEditor { mount, .. } => {
                self.mount_log.push(MountEvent::Mounted(mount));
            }
            Effect::DestroyEditor { mount } => {
                self.mount_log.push(MountEvent::Destroyed(mount));
            }
            Effect::OpenAssetPicker {
                target,
                multiple,
                allowed_types,
            } => {
                self.picker_requests.push(PickerRequest {
                    target,
                    multiple,
                    allowed_types,
                });
            }
            Effect::PersistAttributes { payload, flushed_at } => {
                self.persisted.push((payload, flushed_at));
                let at = self.clock;
                self.send(session, Msg::PersistDone { at });
            }
            Effect::PersistMode { key, mode } => {
                self.state.set(&key, mode.as_str());
            }
        }
    }
}
