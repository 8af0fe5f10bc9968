//! Fixed-rate cooperative animation scheduling.
//!
//! `cadence` paces a tree of cooperatively-suspendable tasks ("frames") at a
//! fixed tick rate, so that independently authored animation fragments run
//! concurrently within a single-threaded loop. Each frame pauses and resumes
//! across ticks while its nested sub-frames advance on their own.
//!
//! The core pieces:
//! - [`runtime::frame`]: the frame tree with propagate-on-resume semantics.
//! - [`runtime::driver`]: the priming step and the timed tick loop.
//! - [`runtime::pacing`]: the rolling average of achieved tick durations.
//! - [`runtime::rate`]: validated tick-rate configuration.
//!
//! Output batching is delegated to a [`transport::Transport`]; storyboards
//! are authored with the vocabulary in [`tween`].

pub mod runtime;
pub mod trace;
pub mod transport;
pub mod tween;

pub use runtime::driver::{Driver, DriverError};
pub use runtime::frame::{
    Frame, FrameState, Routine, Scope, Step, StoryboardError, routine,
};
pub use runtime::pacing::PaceTracker;
pub use runtime::rate::{ConfigError, LinkBudget, TickRate};
pub use trace::init_tracing;
pub use transport::{NullTransport, Transport};
