#![forbid(unsafe_code)]

//! Elm-style runtime for block form sessions.
//!
//! A [`BlockSession`] is the model: it owns one block instance's value
//! store and UI state, consumes [`Msg`]s through [`BlockSession::update`],
//! and renders a [`Node`](bform_render::Node) tree through
//! [`BlockSession::view`]. Updates return a [`Cmd`] describing side
//! effects; the [`Driver`] executes those against the backend traits and
//! feeds results back as messages.
//!
//! Everything runs on one logical event loop. Time is threaded explicitly
//! as milliseconds so debounce and indicator behavior is deterministic
//! under test; the driver advances the clock.

pub mod autosave;
pub mod config;
pub mod driver;
pub mod lookup;
pub mod mode;
pub mod msg;
pub mod session;

pub use autosave::{Autosave, Indicator};
pub use config::EngineConfig;
pub use driver::{Driver, MountEvent};
pub use lookup::LookupTable;
pub use mode::{load_mode, mode_key};
pub use msg::{Cmd, Effect, Msg};
pub use session::{BlockSession, Phase, PreviewState, SessionOptions};
