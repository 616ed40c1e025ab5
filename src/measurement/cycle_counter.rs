//! Hardware cycle counter.

use super::timer::{counter_frequency_hz, read_counter};
use super::{Component, Measurement, Unit};

/// Elapsed counter ticks (`rdtsc` on x86_64, `cntvct_el0` on aarch64).
///
/// Displayed as raw ticks; use [`CycleCounter::elapsed_ns`] for a
/// calibrated conversion.
#[derive(Debug, Clone, Default)]
pub struct CycleCounter {
    started: Option<u64>,
    accum: u64,
    laps: u64,
}

impl CycleCounter {
    /// Create a stopped counter with zero accumulated ticks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stopped counter holding `cycles` accumulated ticks as a single lap.
    pub fn from_cycles(cycles: u64) -> Self {
        Self {
            started: None,
            accum: cycles,
            laps: 1,
        }
    }

    /// Accumulated ticks converted to nanoseconds with the calibrated frequency.
    pub fn elapsed_ns(&self) -> f64 {
        self.accum as f64 * 1e9 / counter_frequency_hz() as f64
    }
}

impl Component for CycleCounter {
    fn label() -> String {
        "cpu_cycles".to_string()
    }

    fn description() -> String {
        "Hardware time-stamp counter ticks".to_string()
    }
}

impl Measurement for CycleCounter {
    #[inline]
    fn start(&mut self) {
        self.started = Some(read_counter());
    }

    #[inline]
    fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.accum = self.accum.saturating_add(read_counter().wrapping_sub(started));
            self.laps += 1;
        }
    }

    fn load(&self) -> u64 {
        self.accum
    }

    fn laps(&self) -> u64 {
        self.laps
    }

    fn is_running(&self) -> bool {
        self.started.is_some()
    }

    fn unit(&self) -> Unit {
        Unit::count("cycles")
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
