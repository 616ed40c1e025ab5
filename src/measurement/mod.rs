//! Measurement primitives.
//!
//! This module provides:
//! - The [`Measurement`] lifecycle contract (start, stop, accumulate, read)
//! - The [`Derivable`] capability used by components computed from a primary
//! - Three primaries: [`WallClock`], [`CpuClock`] and [`CycleCounter`]
//! - Low-level counter reads shared by the primaries
//!
//! # Units
//!
//! Every primary accumulates an integral native count (nanoseconds for the
//! clocks, ticks for the cycle counter). [`Measurement::unit`] returns the
//! display unit together with the factor that turns one native count into one
//! display unit, so `get()` is always `load() * unit().factor`.
//!
//! ```ignore
//! use perfnorm::measurement::{Measurement, WallClock};
//! use perfnorm::TimeUnit;
//!
//! let mut wc = WallClock::new().with_time_unit(TimeUnit::Microsecond);
//! wc.start();
//! do_work();
//! wc.stop();
//! println!("{:.3} {}", wc.get(), wc.unit().name);
//! ```

mod cpu_clock;
mod cycle_counter;
mod timer;
mod wall_clock;

use std::fmt;

use serde::Serialize;

use crate::units::TimeUnit;

pub use cpu_clock::CpuClock;
pub use cycle_counter::CycleCounter;
pub use timer::{black_box, counter_frequency_hz, read_counter};
pub use wall_clock::WallClock;

/// Display unit of a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Unit {
    /// Short name shown in reports (e.g. `msec`, `cycles`).
    pub name: &'static str,
    /// Display units per native count.
    pub factor: f64,
}

impl Unit {
    /// Unit for a timing measurement accumulated in nanoseconds.
    pub fn time(unit: TimeUnit) -> Self {
        Self {
            name: unit.as_str(),
            factor: unit.per_nanosecond(),
        }
    }

    /// Unit for a plain count that is displayed as-is.
    pub const fn count(name: &'static str) -> Self {
        Self { name, factor: 1.0 }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Static identity of anything the registry and reports can list.
pub trait Component {
    /// Short identifier, unique within a registry.
    fn label() -> String;

    /// Free-text description shown alongside the label.
    fn description() -> String;

    /// Label of the primary this component is derived from, if any.
    fn derived_from() -> Option<String> {
        None
    }
}

/// Lifecycle contract of a primary measurement.
///
/// `stop()` adds the elapsed native count since the matching `start()` to the
/// accumulated value, so a measurement started and stopped several times
/// reports the sum of its laps.
pub trait Measurement: Component + Clone + Default + fmt::Debug {
    /// Begin a lap. Calling `start` on a running measurement restarts the lap.
    fn start(&mut self);

    /// End the current lap and accumulate it. No-op if not running.
    fn stop(&mut self);

    /// Accumulated value in native counts.
    fn load(&self) -> u64;

    /// Number of completed laps.
    fn laps(&self) -> u64;

    /// Whether a lap is in progress.
    fn is_running(&self) -> bool;

    /// Display unit and conversion factor.
    fn unit(&self) -> Unit;

    /// Clear the accumulated value and lap count.
    fn reset(&mut self);

    /// Select the display unit for timing measurements. Counts ignore it.
    fn set_time_unit(&mut self, _unit: TimeUnit) {}

    /// Accumulated value converted to the display unit.
    #[inline]
    fn get(&self) -> f64 {
        self.load() as f64 * self.unit().factor
    }

    /// Human-facing value. Equal to [`get`](Measurement::get) unless a
    /// measurement renders its display value differently.
    #[inline]
    fn get_display(&self) -> f64 {
        self.get()
    }
}

/// Capability of a component computed from a single primary measurement.
///
/// The primary is borrowed for the duration of the call only. Returns `true`
/// iff the primary was present and its value was taken over; on `false` the
/// component is left untouched.
pub trait Derivable<P> {
    /// Pull the accumulated value out of `primary`.
    fn derive_from(&mut self, primary: Option<&P>) -> bool;
}
