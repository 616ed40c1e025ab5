//! Display units for timing measurements.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Unit in which timing measurements are displayed.
///
/// Timing primaries accumulate nanoseconds natively; the display unit only
/// affects the value returned by `get()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    /// Nanoseconds.
    #[serde(rename = "nsec")]
    Nanosecond,
    /// Microseconds.
    #[serde(rename = "usec")]
    Microsecond,
    /// Milliseconds.
    #[default]
    #[serde(rename = "msec")]
    Millisecond,
    /// Seconds.
    #[serde(rename = "sec")]
    Second,
}

impl TimeUnit {
    /// Short name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Nanosecond => "nsec",
            TimeUnit::Microsecond => "usec",
            TimeUnit::Millisecond => "msec",
            TimeUnit::Second => "sec",
        }
    }

    /// Number of nanoseconds in one unit.
    pub fn nanos(&self) -> f64 {
        match self {
            TimeUnit::Nanosecond => 1.0,
            TimeUnit::Microsecond => 1e3,
            TimeUnit::Millisecond => 1e6,
            TimeUnit::Second => 1e9,
        }
    }

    /// Factor converting one nanosecond into this unit.
    #[inline]
    pub fn per_nanosecond(&self) -> f64 {
        1.0 / self.nanos()
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ns" | "nsec" | "nanosecond" | "nanoseconds" => Ok(TimeUnit::Nanosecond),
            "us" | "usec" | "microsecond" | "microseconds" => Ok(TimeUnit::Microsecond),
            "ms" | "msec" | "millisecond" | "milliseconds" => Ok(TimeUnit::Millisecond),
            "s" | "sec" | "second" | "seconds" => Ok(TimeUnit::Second),
            _ => Err(Error::InvalidUnit(s.to_string())),
        }
    }
}
