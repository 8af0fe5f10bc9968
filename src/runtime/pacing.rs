//! Rolling average of recent tick durations.

use std::collections::VecDeque;
use std::time::Duration;

/// Number of tick samples the tracker retains.
pub const WINDOW: usize = 50;

/// Bounded rolling window over observed tick durations.
///
/// Purely diagnostic: the average reflects the achieved pace of the last
/// [`WINDOW`] ticks, so an overrunning loop shows up here and nowhere else.
/// Approximate by design; single-threaded, no synchronization.
#[derive(Debug, Clone, Default)]
pub struct PaceTracker {
    window: VecDeque<Duration>,
    sum: Duration,
}

impl PaceTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(WINDOW + 1),
            sum: Duration::ZERO,
        }
    }

    /// Records one tick duration, evicting the oldest sample once the
    /// window exceeds capacity.
    pub fn push(&mut self, elapsed: Duration) {
        self.sum += elapsed;
        self.window.push_back(elapsed);
        if self.window.len() > WINDOW {
            if let Some(oldest) = self.window.pop_front() {
                self.sum -= oldest;
            }
        }
    }

    /// Average of the retained samples, or zero before the first push.
    #[must_use]
    pub fn average(&self) -> Duration {
        if self.window.is_empty() {
            Duration::ZERO
        } else {
            self.sum / self.window.len() as u32
        }
    }

    /// Number of retained samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// True before the first push.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
