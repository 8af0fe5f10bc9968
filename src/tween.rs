//! Storyboard authoring vocabulary: interpolation sweeps, per-tick
//! routines, and seconds-based time units.
//!
//! Nothing here is consumed by the scheduler itself; storyboards use these
//! helpers to describe values over time at the rate the driver will run.

use num_rational::Ratio;
use num_traits::Signed;

use crate::runtime::frame::{Routine, Scope, Step, StoryboardError};
use crate::runtime::rate::TickRate;

/// Exact interpolation value.
pub type Value = Ratio<i64>;

/// Lazy interpolation from `start` to `finish` spread over a time span.
///
/// Yields `rate.ticks_in(seconds) + 1` values. The first and last values
/// exactly equal the requested endpoints, and the sequence is strictly
/// monotonic between distinct endpoints. The step is re-derived from the
/// remaining distance every tick, in exact rational arithmetic, so rounding
/// drift cannot accumulate.
#[derive(Debug, Clone)]
pub struct Sweep {
    start: Value,
    finish: Value,
    value: Value,
    total_ticks: i64,
    tick: i64,
    done: bool,
}

impl Sweep {
    /// Builds a sweep covering `seconds` at `rate`.
    ///
    /// A degenerate sweep with equal endpoints yields its value once.
    #[must_use]
    pub fn over(
        start: impl Into<Value>,
        finish: impl Into<Value>,
        seconds: f64,
        rate: TickRate,
    ) -> Self {
        let start = start.into();
        Self {
            start,
            finish: finish.into(),
            value: start,
            total_ticks: rate.ticks_in(seconds) as i64,
            tick: 0,
            done: false,
        }
    }
}

impl Iterator for Sweep {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        if self.done {
            return None;
        }
        let current = self.value;
        self.tick += 1;
        if current == self.finish {
            self.done = true;
            return Some(current);
        }

        let span = (self.finish - self.start).abs();
        let travelled = (current - self.start).abs();
        // Splitting what is left over the remaining yields keeps the final
        // value landing exactly on `finish`.
        let steps_left = (self.total_ticks + 1 - self.tick).max(1);
        let mut delta = (span - travelled) / Ratio::from_integer(steps_left);
        if self.start > self.finish {
            delta = -delta;
        }
        self.value = current + delta;
        Some(current)
    }
}

/// Routine that applies one value from `values` per tick, finishing when
/// the sequence is exhausted.
pub struct PerTick<I, F> {
    values: I,
    apply: F,
}

/// Drives `apply` with successive values of `values`, one per tick.
pub fn per_tick<I, F>(values: I, apply: F) -> PerTick<I::IntoIter, F>
where
    I: IntoIterator,
    F: FnMut(I::Item),
{
    PerTick {
        values: values.into_iter(),
        apply,
    }
}

impl<I, F> Routine for PerTick<I, F>
where
    I: Iterator,
    F: FnMut(I::Item),
{
    fn step(&mut self, _scope: &mut Scope) -> Result<Step, StoryboardError> {
        match self.values.next() {
            Some(value) => {
                (self.apply)(value);
                Ok(Step::Yield)
            }
            None => Ok(Step::Done),
        }
    }
}

/// Seconds-based vocabulary for storyboard time spans.
pub trait TimeUnits {
    /// The span as seconds.
    fn seconds(self) -> f64;
    /// The span as minutes.
    fn minutes(self) -> f64;
    /// The span as milliseconds.
    fn millis(self) -> f64;
    /// The span of this many ticks at `rate`, as seconds.
    fn ticks(self, rate: TickRate) -> f64;
}

impl TimeUnits for f64 {
    fn seconds(self) -> f64 {
        self
    }

    fn minutes(self) -> f64 {
        self * 60.0
    }

    fn millis(self) -> f64 {
        self / 1000.0
    }

    fn ticks(self, rate: TickRate) -> f64 {
        self / rate.get()
    }
}

impl TimeUnits for u64 {
    fn seconds(self) -> f64 {
        self as f64
    }

    fn minutes(self) -> f64 {
        (self as f64).minutes()
    }

    fn millis(self) -> f64 {
        (self as f64).millis()
    }

    fn ticks(self, rate: TickRate) -> f64 {
        (self as f64).ticks(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::frame::Frame;

    fn rate(ticks_per_second: f64) -> TickRate {
        TickRate::per_second(ticks_per_second).unwrap()
    }

    #[test]
    fn ascending_sweep_hits_both_endpoints_exactly() {
        let values: Vec<Value> = Sweep::over(0, 10, 1.0, rate(30.0)).collect();
        assert_eq!(values.len(), 31);
        assert_eq!(values[0], Value::from_integer(0));
        assert_eq!(*values.last().unwrap(), Value::from_integer(10));
        assert!(values.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn descending_sweep_terminates_exactly_at_finish() {
        let values: Vec<Value> = Sweep::over(20, 0, 0.1, rate(30.0)).collect();
        assert_eq!(values[0], Value::from_integer(20));
        assert_eq!(*values.last().unwrap(), Value::from_integer(0));
        assert!(values.windows(2).all(|pair| pair[0] > pair[1]));
    }

    #[test]
    fn degenerate_sweep_yields_once() {
        let values: Vec<Value> = Sweep::over(7, 7, 1.0, rate(30.0)).collect();
        assert_eq!(values, [Value::from_integer(7)]);
    }

    #[test]
    fn fractional_endpoints_stay_exact() {
        let start = Value::new(1, 3);
        let finish = Value::new(2, 3);
        let values: Vec<Value> = Sweep::over(start, finish, 1.0, rate(10.0)).collect();
        assert_eq!(values.len(), 11);
        assert_eq!(values[0], start);
        assert_eq!(*values.last().unwrap(), finish);
    }

    #[test]
    fn per_tick_frame_dies_one_resume_after_the_last_value() {
        let mut applied = 0usize;
        let sweep = Sweep::over(0, 4, 4.0, rate(1.0));
        let mut frame = Frame::new(per_tick(sweep, move |_| applied += 1));

        let mut resumes = 0;
        while frame.is_alive() {
            frame.resume().unwrap();
            resumes += 1;
        }
        // Five values, then one more resume to observe exhaustion.
        assert_eq!(resumes, 6);
    }

    #[test]
    fn time_units_convert_to_seconds() {
        assert_eq!(2.0.minutes(), 120.0);
        assert_eq!(250.0.millis(), 0.25);
        assert_eq!(3u64.seconds(), 3.0);
        assert_eq!(30u64.ticks(rate(30.0)), 1.0);
    }
}
