//! The tick driver: owns the frame tree root and paces the loop.
//!
//! One driver per run. Construction runs the storyboard exactly once to
//! populate the tree (the priming step) and performs no timed work; every
//! caller-initiated advance then executes one tick:
//!
//! 1. if no frame in the tree is alive, the root's computation returns and
//!    the run is over;
//! 2. otherwise resume every direct child of the root, in creation order,
//!    inside one buffered transport scope;
//! 3. record the elapsed time in the pacing tracker;
//! 4. block out whatever remains of the tick budget, and report the time
//!    actually spent waiting.
//!
//! An overrunning tick is not an error: the remaining wait saturates to
//! zero and the achieved pace degrades, observable through the tracker.

use std::thread;
use std::time::Duration;

use minstant::Instant;
use thiserror::Error;

use crate::runtime::frame::{Frame, FrameState, Scope, StoryboardError};
use crate::runtime::pacing::PaceTracker;
use crate::runtime::rate::TickRate;
use crate::trace::{debug, error, info, trace};
use crate::transport::Transport;

/// Failure that aborts a scheduling run.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The storyboard or one of its frame routines failed.
    #[error("storyboard failed: {0}")]
    Storyboard(StoryboardError),
}

/// Root task node.
///
/// Its children are the storyboard's top-level frames. Its own body is the
/// driver loop, held as an explicit state machine and driven through
/// [`Driver::advance_once`]; the suspension after priming is the first
/// yield point, and every tick ends in another.
#[derive(Debug)]
struct RootFrame {
    state: FrameState,
    children: Vec<Frame>,
}

/// The scheduling session: the root of the frame tree plus its pacing loop.
pub struct Driver<T> {
    transport: T,
    rate: TickRate,
    tracker: PaceTracker,
    root: RootFrame,
}

impl<T: Transport> Driver<T> {
    /// Builds the session and primes it: `storyboard` runs exactly once,
    /// spawning the initial frames through its [`Scope`], and the root
    /// suspends without doing any timed work.
    ///
    /// # Errors
    ///
    /// A storyboard failure is returned as [`DriverError::Storyboard`] and
    /// no driver is produced.
    pub fn new(
        rate: TickRate,
        transport: T,
        storyboard: impl FnOnce(&mut Scope) -> Result<(), StoryboardError>,
    ) -> Result<Self, DriverError> {
        let mut scope = Scope::new();
        let primed = storyboard(&mut scope);
        let children = scope.into_frames();
        if let Err(err) = primed {
            error!(error = %err, "storyboard failed during priming");
            return Err(DriverError::Storyboard(err));
        }
        info!(
            frames = children.len(),
            ticks_per_second = rate.get(),
            "storyboard primed"
        );
        Ok(Self {
            transport,
            rate,
            tracker: PaceTracker::new(),
            root: RootFrame {
                state: FrameState::Suspended,
                children,
            },
        })
    }

    /// Drives the root through exactly one pending suspension point.
    ///
    /// Returns the time actually spent waiting at the end of the tick, or
    /// `None` when this advance completed the run (or the run was already
    /// complete). The value is purely informational.
    ///
    /// # Errors
    ///
    /// The first routine failure aborts the run. The buffered transport
    /// scope still commits before the error is returned.
    pub fn advance_once(&mut self) -> Result<Option<Duration>, DriverError> {
        if self.root.state == FrameState::Dead {
            return Ok(None);
        }
        if !self.root.children.iter().any(Frame::has_live_work) {
            self.root.state = FrameState::Dead;
            info!("no live frames remain; run complete");
            return Ok(None);
        }

        self.root.state = FrameState::Running;
        let started = Instant::now();
        let transport = &mut self.transport;
        let children = &mut self.root.children;
        let outcome = transport.buffered(|| -> Result<(), StoryboardError> {
            for frame in children.iter_mut() {
                frame.resume()?;
            }
            Ok(())
        });
        if let Err(err) = outcome {
            self.root.state = FrameState::Dead;
            error!(error = %err, "frame routine failed; run aborted");
            return Err(DriverError::Storyboard(err));
        }

        let elapsed = started.elapsed();
        self.tracker.push(elapsed);
        let budget = self.rate.tick_duration().saturating_sub(elapsed);
        let slept = wait_out(budget);
        trace!(?elapsed, ?slept, average = ?self.tracker.average(), "tick");
        self.root.state = FrameState::Suspended;
        Ok(Some(slept))
    }

    /// Advances until the root is dead.
    ///
    /// # Errors
    ///
    /// Stops at the first routine failure; see [`Driver::advance_once`].
    pub fn run_to_completion(&mut self) -> Result<(), DriverError> {
        while self.is_running() {
            self.advance_once()?;
        }
        Ok(())
    }

    /// False once the run has completed or aborted.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.root.state != FrameState::Dead
    }

    /// The configured tick rate.
    #[must_use]
    pub fn tick_rate(&self) -> TickRate {
        self.rate
    }

    /// Replaces the configured tick rate; takes effect on the next tick.
    pub fn set_tick_rate(&mut self, rate: TickRate) {
        debug!(ticks_per_second = rate.get(), "tick rate replaced");
        self.rate = rate;
    }

    /// Duration of one tick at the configured rate.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        self.rate.tick_duration()
    }

    /// Rolling average of recent tick durations.
    #[must_use]
    pub fn average_tick_duration(&self) -> Duration {
        self.tracker.average()
    }

    /// Read access to the pacing tracker.
    #[must_use]
    pub fn pacing(&self) -> &PaceTracker {
        &self.tracker
    }
}

/// Blocks for `budget` and reports the time actually spent blocked.
fn wait_out(budget: Duration) -> Duration {
    let started = Instant::now();
    if !budget.is_zero() {
        thread::sleep(budget);
    }
    started.elapsed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::frame::{Step, routine};
    use crate::transport::NullTransport;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    /// Transport double that logs scope boundaries next to frame writes.
    struct ScopedTransport {
        log: Log,
    }

    impl Transport for ScopedTransport {
        fn buffered<R>(&mut self, body: impl FnOnce() -> R) -> R {
            self.log.borrow_mut().push("open");
            let result = body();
            self.log.borrow_mut().push("commit");
            result
        }
    }

    /// A millisecond tick keeps these tests fast.
    fn fast_rate() -> TickRate {
        TickRate::per_second(1000.0).unwrap()
    }

    fn yields(n: usize) -> impl crate::runtime::frame::Routine + 'static {
        let mut remaining = n;
        routine(move |_| {
            if remaining == 0 {
                Ok(Step::Done)
            } else {
                remaining -= 1;
                Ok(Step::Yield)
            }
        })
    }

    #[test]
    fn empty_storyboard_dies_on_first_advance() {
        let mut driver = Driver::new(fast_rate(), NullTransport, |_| Ok(())).unwrap();
        assert!(driver.is_running());
        assert_eq!(driver.advance_once().unwrap(), None);
        assert!(!driver.is_running());
    }

    #[test]
    fn run_lasts_until_the_longest_frame_dies() {
        let mut driver = Driver::new(fast_rate(), NullTransport, |scope| {
            scope.spawn(yields(2));
            scope.spawn(yields(4));
            Ok(())
        })
        .unwrap();

        let mut ticks = 0;
        while driver.advance_once().unwrap().is_some() {
            ticks += 1;
        }
        // The longer frame yields 4 times and dies on its 5th resume.
        assert_eq!(ticks, 5);
        assert_eq!(driver.pacing().len(), 5);
        assert!(!driver.is_running());
    }

    #[test]
    fn each_tick_wraps_the_resumes_in_one_scope() {
        let log: Log = Rc::default();
        let transport = ScopedTransport {
            log: Rc::clone(&log),
        };
        let mut driver = Driver::new(fast_rate(), transport, {
            let log = Rc::clone(&log);
            move |scope| {
                let log = Rc::clone(&log);
                let mut remaining = 2usize;
                scope.spawn(routine(move |_| {
                    if remaining == 0 {
                        return Ok(Step::Done);
                    }
                    remaining -= 1;
                    log.borrow_mut().push("write");
                    Ok(Step::Yield)
                }));
                Ok(())
            }
        })
        .unwrap();

        driver.run_to_completion().unwrap();
        assert_eq!(
            *log.borrow(),
            ["open", "write", "commit", "open", "write", "commit", "open", "commit"]
        );
    }

    #[test]
    fn scope_commits_even_when_a_routine_fails() {
        let log: Log = Rc::default();
        let transport = ScopedTransport {
            log: Rc::clone(&log),
        };
        let mut driver = Driver::new(fast_rate(), transport, |scope| {
            scope.spawn(routine(|_| Err("flicker".into())));
            Ok(())
        })
        .unwrap();

        let err = driver.advance_once().unwrap_err();
        assert!(matches!(err, DriverError::Storyboard(_)));
        assert_eq!(err.to_string(), "storyboard failed: flicker");
        assert_eq!(*log.borrow(), ["open", "commit"]);
        assert!(!driver.is_running());
        assert_eq!(driver.advance_once().unwrap(), None);
    }

    #[test]
    fn storyboard_error_fails_construction() {
        let result = Driver::new(fast_rate(), NullTransport, |_| Err("dark".into()));
        let err = result.err().expect("priming should fail");
        assert_eq!(err.to_string(), "storyboard failed: dark");
    }

    #[test]
    fn explicit_rate_override_sets_exact_tick_duration() {
        let rate = TickRate::per_second(40.0).unwrap();
        let driver = Driver::new(rate, NullTransport, |_| Ok(())).unwrap();
        assert_eq!(driver.tick_duration(), Duration::from_secs_f64(1.0 / 40.0));
    }

    #[test]
    fn set_tick_rate_replaces_the_configured_rate() {
        let mut driver = Driver::new(fast_rate(), NullTransport, |_| Ok(())).unwrap();
        let slower = TickRate::per_second(500.0).unwrap();
        driver.set_tick_rate(slower);
        assert_eq!(driver.tick_rate(), slower);
        assert_eq!(driver.tick_duration(), Duration::from_secs_f64(1.0 / 500.0));
    }

    #[test]
    fn advance_after_completion_stays_complete() {
        let mut driver = Driver::new(fast_rate(), NullTransport, |_| Ok(())).unwrap();
        assert_eq!(driver.advance_once().unwrap(), None);
        assert_eq!(driver.advance_once().unwrap(), None);
        assert!(driver.pacing().is_empty());
    }

    #[test]
    fn dead_top_level_frame_keeps_its_children_ticking() {
        let log: Log = Rc::default();
        let mut driver = Driver::new(fast_rate(), NullTransport, {
            let log = Rc::clone(&log);
            move |scope| {
                let log = Rc::clone(&log);
                scope.spawn(routine(move |scope: &mut Scope| {
                    let log = Rc::clone(&log);
                    let mut remaining = 3usize;
                    scope.spawn(routine(move |_| {
                        if remaining == 0 {
                            return Ok(Step::Done);
                        }
                        remaining -= 1;
                        log.borrow_mut().push("child");
                        Ok(Step::Yield)
                    }));
                    Ok(Step::Done)
                }));
                Ok(())
            }
        })
        .unwrap();

        driver.run_to_completion().unwrap();
        assert_eq!(*log.borrow(), ["child", "child", "child"]);
    }
}
