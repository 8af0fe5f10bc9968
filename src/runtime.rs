//! Scheduling runtime: the frame tree, its pacing, and the tick driver.
//!
//! - `frame`: cooperative task nodes with propagate-on-resume semantics.
//! - `pacing`: rolling average of observed tick durations.
//! - `rate`: validated tick-rate configuration and the link-budget default.
//! - `driver`: the priming step and the timed tick loop.

pub mod driver;
pub mod frame;
pub mod pacing;
pub mod rate;
