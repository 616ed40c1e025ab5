//! Size-normalized view of a primary measurement.
//!
//! [`Normalized<T>`] never starts or stops anything itself. A region runs its
//! primary `T`, and when the region closes the normalized component copies the
//! primary's accumulated value via [`Normalized::derive`]. Reads divide that
//! value by the data size stored with [`Normalized::store`].
//!
//! ```ignore
//! use perfnorm::measurement::{Measurement, WallClock};
//! use perfnorm::Normalized;
//!
//! let mut wc = WallClock::new();
//! let mut per_item = Normalized::<WallClock>::new();
//!
//! wc.start();
//! process(&items);
//! wc.stop();
//!
//! per_item.store(items.len() as u64)?;
//! assert!(per_item.derive(Some(&wc)));
//! println!("{:.3} {} per item", per_item.get(), per_item.unit());
//! ```
//!
//! A data size of zero is rejected with [`Error::ZeroDataSize`] and the
//! previous divisor stays in effect.

use std::num::NonZeroU64;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::measurement::{Component, Derivable, Measurement, Unit};

/// Whether a normalized component has taken a value from its primary yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DeriveState {
    /// No successful derivation yet; reads see the zero-valued default primary.
    #[default]
    Unset,
    /// A primary value has been copied in.
    Derived,
}

/// A primary measurement `T` divided by a data size.
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    value: T,
    data_size: NonZeroU64,
    state: DeriveState,
}

impl<T: Measurement> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
            data_size: NonZeroU64::MIN,
            state: DeriveState::Unset,
        }
    }
}

impl<T: Measurement> Normalized<T> {
    /// Create an unset component with a data size of 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the normalization divisor for subsequent reads.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroDataSize`] if `data_size` is 0; the current
    /// divisor is kept.
    pub fn store(&mut self, data_size: u64) -> Result<()> {
        let size = NonZeroU64::new(data_size).ok_or(Error::ZeroDataSize)?;
        self.data_size = size;
        Ok(())
    }

    /// Copy the accumulated value of `primary`.
    ///
    /// Returns `false` and leaves the component untouched if `primary` is
    /// absent.
    pub fn derive(&mut self, primary: Option<&T>) -> bool {
        match primary {
            Some(p) => {
                self.value = p.clone();
                self.state = DeriveState::Derived;
                true
            }
            None => false,
        }
    }

    /// Whether the primary this component depends on is available.
    pub fn assemble(&self, primary: Option<&T>) -> bool {
        primary.is_some()
    }

    /// Primary value in its display unit, divided by the data size.
    #[inline]
    pub fn get(&self) -> f64 {
        self.value.get() / self.divisor()
    }

    /// Primary display value divided by the data size.
    ///
    /// Numerically equal to [`get`](Self::get) for the primaries in this
    /// crate. Primaries that render their display value differently make the
    /// two diverge.
    #[inline]
    pub fn get_display(&self) -> f64 {
        self.value.get_display() / self.divisor()
    }

    /// Unit of the primary.
    pub fn unit(&self) -> Unit {
        self.value.unit()
    }

    /// Display unit name of the primary.
    pub fn display_unit(&self) -> &'static str {
        self.value.unit().name
    }

    /// Current normalization divisor.
    pub fn data_size(&self) -> u64 {
        self.data_size.get()
    }

    /// The derived primary value, unnormalized.
    pub fn raw(&self) -> &T {
        &self.value
    }

    /// Derivation state.
    pub fn state(&self) -> DeriveState {
        self.state
    }

    /// Shorthand for `state() == DeriveState::Derived`.
    pub fn is_derived(&self) -> bool {
        self.state == DeriveState::Derived
    }

    #[inline]
    fn divisor(&self) -> f64 {
        self.data_size.get() as f64
    }
}

impl<T: Measurement> Component for Normalized<T> {
    fn label() -> String {
        format!("normalized_{}", T::label())
    }

    fn description() -> String {
        format!("{} normalized to data size", T::description())
    }

    fn derived_from() -> Option<String> {
        Some(T::label())
    }
}

impl<T: Measurement> Derivable<T> for Normalized<T> {
    fn derive_from(&mut self, primary: Option<&T>) -> bool {
        self.derive(primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{CpuClock, CycleCounter, WallClock};
    use crate::units::TimeUnit;

    #[test]
    fn test_defaults() {
        let n = Normalized::<WallClock>::new();
        assert_eq!(n.data_size(), 1);
        assert_eq!(n.state(), DeriveState::Unset);
        assert_eq!(n.get(), 0.0);
    }

    #[test]
    fn test_million_over_thousand() {
        let primary = CycleCounter::from_cycles(1_000_000);
        let mut n = Normalized::<CycleCounter>::new();
        n.store(1_000).unwrap();
        assert!(n.derive(Some(&primary)));
        assert_eq!(n.get(), 1_000.0);
        assert_eq!(n.display_unit(), "cycles");
    }

    #[test]
    fn test_unit_conversion_before_division() {
        let primary = WallClock::from_nanos(4_000_000).with_time_unit(TimeUnit::Millisecond);
        let mut n = Normalized::<WallClock>::new();
        n.store(8).unwrap();
        n.derive(Some(&primary));
        assert!((n.get() - 0.5).abs() < 1e-12);
        assert_eq!(n.unit().name, "msec");
    }

    #[test]
    fn test_default_size_is_identity() {
        let primary = CpuClock::from_nanos(12_345).with_time_unit(TimeUnit::Nanosecond);
        let mut n = Normalized::<CpuClock>::new();
        n.derive(Some(&primary));
        assert_eq!(n.get(), primary.get());
    }

    #[test]
    fn test_derive_none_keeps_value() {
        let primary = CycleCounter::from_cycles(500);
        let mut n = Normalized::<CycleCounter>::new();
        assert!(n.derive(Some(&primary)));
        assert!(!n.derive(None));
        assert_eq!(n.raw().load(), 500);
        assert!(n.is_derived());
    }

    #[test]
    fn test_derive_none_on_unset() {
        let mut n = Normalized::<WallClock>::new();
        assert!(!n.derive(None));
        assert_eq!(n.state(), DeriveState::Unset);
    }

    #[test]
    fn test_store_zero_rejected() {
        let primary = CycleCounter::from_cycles(900);
        let mut n = Normalized::<CycleCounter>::new();
        n.store(3).unwrap();
        n.derive(Some(&primary));

        assert!(matches!(n.store(0), Err(Error::ZeroDataSize)));
        assert_eq!(n.data_size(), 3);
        assert_eq!(n.get(), 300.0);
    }

    #[test]
    fn test_get_is_idempotent() {
        let primary = WallClock::from_nanos(777).with_time_unit(TimeUnit::Nanosecond);
        let mut n = Normalized::<WallClock>::new();
        n.store(7).unwrap();
        n.derive(Some(&primary));
        let first = n.get();
        assert_eq!(first, n.get());
        assert_eq!(first, n.get_display());
    }

    #[test]
    fn test_primary_unchanged_by_derive() {
        let mut primary = WallClock::new();
        primary.start();
        primary.stop();
        let before = primary.load();

        let mut n = Normalized::<WallClock>::new();
        n.derive(Some(&primary));
        assert_eq!(primary.load(), before);
        assert!(!primary.is_running());
    }

    #[test]
    fn test_labels() {
        assert_eq!(Normalized::<WallClock>::label(), "normalized_wall_clock");
        assert_eq!(
            Normalized::<CpuClock>::description(),
            "Total CPU time spent in both user- and kernel-mode normalized to data size"
        );
        assert_eq!(
            Normalized::<CycleCounter>::derived_from().as_deref(),
            Some("cpu_cycles")
        );
    }

    #[test]
    fn test_assemble() {
        let n = Normalized::<WallClock>::new();
        assert!(n.assemble(Some(&WallClock::new())));
        assert!(!n.assemble(None));
    }

    #[test]
    fn test_derivable_trait() {
        fn pull<D: Derivable<CycleCounter>>(d: &mut D, p: Option<&CycleCounter>) -> bool {
            d.derive_from(p)
        }
        let mut n = Normalized::<CycleCounter>::new();
        assert!(pull(&mut n, Some(&CycleCounter::from_cycles(10))));
        assert!(!pull(&mut n, None));
        assert_eq!(n.get(), 10.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::measurement::CycleCounter;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn get_is_value_over_size(v in 0u64..(1u64 << 52), d in 1u64..1_000_000) {
            let primary = CycleCounter::from_cycles(v);
            let mut n = Normalized::<CycleCounter>::new();
            n.store(d).unwrap();
            prop_assert!(n.derive(Some(&primary)));
            prop_assert_eq!(n.get(), v as f64 / d as f64);
        }

        #[test]
        fn zero_never_changes_divisor(d in 1u64..u64::MAX) {
            let mut n = Normalized::<CycleCounter>::new();
            n.store(d).unwrap();
            prop_assert!(n.store(0).is_err());
            prop_assert_eq!(n.data_size(), d);
        }
    }
}
