//! telemetry/mod.rs
//! Slice stream telemetry: counters, timers, and immutable snapshots.
//!
//! - Counters are plain integers bumped by the owning stream (no atomics, the
//!   stream is single-threaded).
//! - Snapshots are detached copies, safe to log or serialize.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
