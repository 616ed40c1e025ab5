//! Behavior of the normalized component through the public API.
//!
//! Covers:
//! - Division by the stored data size after unit conversion
//! - Default data size of 1
//! - Missing-primary derivation
//! - Zero data size policy
//! - Primaries whose display value differs from `get()`

use perfnorm::{
    Component, CycleCounter, Derivable, DeriveState, Error, Measurement, Normalized, TimeUnit,
    Unit, WallClock,
};

// ============================================================================
// A primary with a custom display rendering
// ============================================================================

/// Byte counter whose display value is in KiB while `get()` stays in bytes.
#[derive(Debug, Clone, Default)]
struct Bytes {
    total: u64,
    laps: u64,
}

impl Component for Bytes {
    fn label() -> String {
        "bytes".to_string()
    }

    fn description() -> String {
        "Bytes processed".to_string()
    }
}

impl Measurement for Bytes {
    fn start(&mut self) {}

    fn stop(&mut self) {
        self.laps += 1;
    }

    fn load(&self) -> u64 {
        self.total
    }

    fn laps(&self) -> u64 {
        self.laps
    }

    fn is_running(&self) -> bool {
        false
    }

    fn unit(&self) -> Unit {
        Unit::count("B")
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn get_display(&self) -> f64 {
        self.get() / 1024.0
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn million_native_units_over_thousand_items() {
    let primary = WallClock::from_nanos(1_000_000).with_time_unit(TimeUnit::Nanosecond);
    let mut n = Normalized::<WallClock>::new();
    n.store(1_000).unwrap();
    assert!(n.derive(Some(&primary)));
    assert_eq!(n.get(), 1_000.0);
}

#[test]
fn display_unit_applied_before_division() {
    let primary = WallClock::from_nanos(3_000_000_000).with_time_unit(TimeUnit::Second);
    let mut n = Normalized::<WallClock>::new();
    n.store(6).unwrap();
    n.derive(Some(&primary));
    assert!((n.get() - 0.5).abs() < 1e-12);
    assert_eq!(n.display_unit(), "sec");
}

#[test]
fn unset_data_size_is_identity() {
    let primary = CycleCounter::from_cycles(98_765);
    let mut n = Normalized::<CycleCounter>::new();
    n.derive(Some(&primary));
    assert_eq!(n.data_size(), 1);
    assert_eq!(n.get(), primary.get());
}

#[test]
fn derive_none_returns_false_and_keeps_value() {
    let mut n = Normalized::<CycleCounter>::new();
    n.derive(Some(&CycleCounter::from_cycles(64)));
    n.store(4).unwrap();

    assert!(!n.derive(None));
    assert_eq!(n.get(), 16.0);
    assert_eq!(n.state(), DeriveState::Derived);
}

#[test]
fn store_can_follow_derive() {
    let mut n = Normalized::<CycleCounter>::new();
    n.derive(Some(&CycleCounter::from_cycles(100)));
    assert_eq!(n.get(), 100.0);
    n.store(25).unwrap();
    assert_eq!(n.get(), 4.0);
}

#[test]
fn store_zero_is_rejected_deterministically() {
    let mut n = Normalized::<CycleCounter>::new();
    n.derive(Some(&CycleCounter::from_cycles(10)));

    for _ in 0..3 {
        assert!(matches!(n.store(0), Err(Error::ZeroDataSize)));
        assert_eq!(n.data_size(), 1);
        assert_eq!(n.get(), 10.0);
        assert!(n.get().is_finite());
    }
}

#[test]
fn get_does_not_mutate() {
    let mut n = Normalized::<WallClock>::new();
    n.store(3).unwrap();
    n.derive(Some(&WallClock::from_nanos(9_000)));
    let a = n.get();
    let b = n.get();
    assert_eq!(a, b);
    assert_eq!(n.data_size(), 3);
    assert_eq!(n.raw().load(), 9_000);
}

#[test]
fn get_display_may_differ_from_get() {
    let primary = Bytes {
        total: 8 * 1024,
        laps: 1,
    };
    let mut n = Normalized::<Bytes>::new();
    n.store(2).unwrap();
    n.derive(Some(&primary));

    assert_eq!(n.get(), 4096.0);
    assert_eq!(n.get_display(), 4.0);
}

#[test]
fn normalized_labels_follow_primary() {
    assert_eq!(Normalized::<Bytes>::label(), "normalized_bytes");
    assert_eq!(
        Normalized::<Bytes>::description(),
        "Bytes processed normalized to data size"
    );
    assert_eq!(Normalized::<Bytes>::derived_from().as_deref(), Some("bytes"));
}

#[test]
fn derivable_as_generic_capability() {
    fn derive_all<P, D: Derivable<P>>(targets: &mut [D], primary: Option<&P>) -> usize {
        targets
            .iter_mut()
            .map(|t| t.derive_from(primary))
            .filter(|ok| *ok)
            .count()
    }

    let primary = CycleCounter::from_cycles(12);
    let mut targets = vec![Normalized::<CycleCounter>::new(); 3];
    assert_eq!(derive_all(&mut targets, Some(&primary)), 3);
    assert_eq!(derive_all(&mut targets, None), 0);
    assert!(targets.iter().all(|t| t.get() == 12.0));
}
