#![forbid(unsafe_code)]

//! Per-instance state for blockform: the value store (with its two
//! persisted encodings) and the repeater row engine.

pub mod repeater;
pub mod store;

pub use repeater::RepeaterState;
pub use store::{Persisted, ValueStore};
