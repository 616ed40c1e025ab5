//! Monotonic wall-clock timer.

use std::time::Instant;

use super::{Component, Measurement, Unit};
use crate::units::TimeUnit;

/// Elapsed real time, accumulated in nanoseconds.
#[derive(Debug, Clone, Default)]
pub struct WallClock {
    started: Option<Instant>,
    accum_ns: u64,
    laps: u64,
    unit: TimeUnit,
}

impl WallClock {
    /// Create a stopped timer with zero accumulated time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stopped timer holding `nanos` of accumulated time as a single lap.
    pub fn from_nanos(nanos: u64) -> Self {
        Self {
            accum_ns: nanos,
            laps: 1,
            ..Self::default()
        }
    }

    /// Set the display unit.
    pub fn with_time_unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }
}

impl Component for WallClock {
    fn label() -> String {
        "wall_clock".to_string()
    }

    fn description() -> String {
        "Real-clock timer (i.e. wall-clock timer)".to_string()
    }
}

impl Measurement for WallClock {
    #[inline]
    fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    #[inline]
    fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            let elapsed = started.elapsed().as_nanos() as u64;
            self.accum_ns = self.accum_ns.saturating_add(elapsed);
            self.laps += 1;
        }
    }

    fn load(&self) -> u64 {
        self.accum_ns
    }

    fn laps(&self) -> u64 {
        self.laps
    }

    fn is_running(&self) -> bool {
        self.started.is_some()
    }

    fn unit(&self) -> Unit {
        Unit::time(self.unit)
    }

    fn reset(&mut self) {
        self.started = None;
        self.accum_ns = 0;
        self.laps = 0;
    }

    fn set_time_unit(&mut self, unit: TimeUnit) {
        self.unit = unit;
    }
}
