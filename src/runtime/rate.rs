//! Tick-rate configuration and the link budget it derives from.
//!
//! A run is paced in ticks per second. The default rate is not arbitrary:
//! it is the number of whole per-tick payloads the output link can carry
//! each second, derived from a [`LinkBudget`]. An explicitly constructed
//! [`TickRate`] replaces that default entirely.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration failure, reported before any tick runs.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// Tick rates must be positive and finite.
    #[error("tick rate must be positive and finite, got {0}")]
    InvalidTickRate(f64),
    /// A link budget with a zero field derives no rate.
    #[error("link budget needs nonzero bandwidth and payload size")]
    EmptyLinkBudget,
}

/// Target tick frequency, in ticks per second.
///
/// Always positive and finite; both ways of obtaining one validate.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TickRate(f64);

impl TickRate {
    /// Creates a rate of `ticks_per_second`.
    ///
    /// # Errors
    ///
    /// Rejects non-positive and non-finite rates.
    pub fn per_second(ticks_per_second: f64) -> Result<Self, ConfigError> {
        if ticks_per_second.is_finite() && ticks_per_second > 0.0 {
            Ok(Self(ticks_per_second))
        } else {
            Err(ConfigError::InvalidTickRate(ticks_per_second))
        }
    }

    /// Ticks per second as a raw number.
    #[inline]
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }

    /// Duration of a single tick at this rate.
    #[inline]
    #[must_use]
    pub fn tick_duration(self) -> Duration {
        Duration::from_secs_f64(self.0.recip())
    }

    /// Whole ticks contained in `seconds`, never fewer than one.
    #[must_use]
    pub fn ticks_in(self, seconds: f64) -> u64 {
        (seconds * self.0).round().max(1.0) as u64
    }
}

impl Default for TickRate {
    /// The rate the default link budget sustains.
    fn default() -> Self {
        LinkBudget::default()
            .tick_rate()
            .expect("default link budget is nonzero")
    }
}

impl TryFrom<f64> for TickRate {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, ConfigError> {
        Self::per_second(value)
    }
}

impl From<TickRate> for f64 {
    fn from(rate: TickRate) -> Self {
        rate.0
    }
}

/// Output link budget from which the default tick rate is derived.
///
/// The derived rate is `bits_per_second / (8 * payload_bytes)`: the number
/// of whole per-tick payloads the link can carry each second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkBudget {
    /// Raw line rate of the output link, in bits per second.
    pub bits_per_second: u64,
    /// Bytes emitted per tick, framing included.
    pub payload_bytes: u64,
}

impl LinkBudget {
    /// Derives the tick rate this budget sustains.
    ///
    /// # Errors
    ///
    /// A zero bandwidth or payload size derives no rate.
    pub fn tick_rate(self) -> Result<TickRate, ConfigError> {
        if self.bits_per_second == 0 || self.payload_bytes == 0 {
            return Err(ConfigError::EmptyLinkBudget);
        }
        TickRate::per_second(self.bits_per_second as f64 / (8 * self.payload_bytes) as f64)
    }
}

impl Default for LinkBudget {
    /// A 250 kbit/s serial link carrying a 512-byte frame plus 6 framing
    /// bytes per tick, roughly 60.3 ticks per second.
    fn default() -> Self {
        Self {
            bits_per_second: 250_000,
            payload_bytes: 518,
        }
    }
}
