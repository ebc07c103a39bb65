//! Duration precision applied before histogram bucketing.
//!
//! A precision is a divisor in nanoseconds. It is validated once when a sink is
//! built: a zero divisor falls back to nanoseconds, so observation paths never
//! re-check it.

use std::num::NonZeroU64;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Named precision units accepted by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecisionUnit {
    #[default]
    Ns,
    Us,
    Ms,
    S,
}

impl PrecisionUnit {
    /// Length of one unit in nanoseconds.
    pub fn nanos(self) -> u64 {
        match self {
            PrecisionUnit::Ns => 1,
            PrecisionUnit::Us => 1_000,
            PrecisionUnit::Ms => 1_000_000,
            PrecisionUnit::S => 1_000_000_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrecisionUnit::Ns => "ns",
            PrecisionUnit::Us => "us",
            PrecisionUnit::Ms => "ms",
            PrecisionUnit::S => "s",
        }
    }
}

/// Validated, non-zero duration divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Precision {
    divisor: NonZeroU64,
}

impl Precision {
    /// Nanosecond resolution (divisor 1).
    pub const NANOS: Precision = Precision {
        divisor: NonZeroU64::MIN,
    };

    /// Build from a raw divisor in nanoseconds. Zero means nanoseconds.
    pub fn new(divisor_nanos: u64) -> Self {
        NonZeroU64::new(divisor_nanos)
            .map(|divisor| Self { divisor })
            .unwrap_or(Self::NANOS)
    }

    /// Build from a duration (e.g. `Duration::from_micros(1)`).
    /// A zero duration means nanoseconds.
    pub fn from_duration(unit: Duration) -> Self {
        Self::new(u64::try_from(unit.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn divisor(&self) -> u64 {
        self.divisor.get()
    }

    /// Convert a duration into precision units (truncating).
    pub fn scale(&self, d: Duration) -> u64 {
        let units = d.as_nanos() / u128::from(self.divisor.get());
        u64::try_from(units).unwrap_or(u64::MAX)
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::NANOS
    }
}

impl From<PrecisionUnit> for Precision {
    fn from(unit: PrecisionUnit) -> Self {
        Self::new(unit.nanos())
    }
}
