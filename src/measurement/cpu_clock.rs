//! Process CPU-time timer.

use super::{Component, Measurement, Unit};
use crate::units::TimeUnit;

/// CPU time consumed by the whole process (user + system), in nanoseconds.
///
/// Uses `CLOCK_PROCESS_CPUTIME_ID` on unix. Elsewhere falls back to a
/// monotonic clock, so the value degrades to wall-clock time.
#[derive(Debug, Clone, Default)]
pub struct CpuClock {
    started: Option<u64>,
    accum_ns: u64,
    laps: u64,
    unit: TimeUnit,
}

impl CpuClock {
    /// Create a stopped timer with zero accumulated time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stopped timer holding `nanos` of accumulated CPU time as a single lap.
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

#[cfg(unix)]
fn process_cpu_nanos() -> u64 {
    // SAFETY: timespec is plain old data; all-zero is a valid value and the
    // pointer stays valid for the duration of the call.
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
    if rc != 0 {
        tracing::debug!("clock_gettime(CLOCK_PROCESS_CPUTIME_ID) failed");
        return 0;
    }
    (ts.tv_sec as u64)
        .saturating_mul(1_000_000_000)
        .saturating_add(ts.tv_nsec as u64)
}

#[cfg(not(unix))]
fn process_cpu_nanos() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

impl Component for CpuClock {
    fn label() -> String {
        "cpu_clock".to_string()
    }

    fn description() -> String {
        "Total CPU time spent in both user- and kernel-mode".to_string()
    }
}

impl Measurement for CpuClock {
    #[inline]
    fn start(&mut self) {
        self.started = Some(process_cpu_nanos());
    }

    #[inline]
    fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            let elapsed = process_cpu_nanos().saturating_sub(started);
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
