//! Running statistics for recorded metric values.
//!
//! Mean and variance use Welford's online update, and merging uses the
//! parallel combination of `(count, mean, m2)`, so large-magnitude samples
//! (raw cycle counts, nanosecond timings) keep their spread.

/// Streaming count, sum, mean, variance, min and max of a stream of values.
///
/// Two accumulators can be merged; the result matches pushing both streams
/// into one accumulator up to floating-point rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    count: u64,
    sum: f64,
    mean: f64,
    /// Sum of squared deviations from the running mean.
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Statistics {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value.
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Fold another accumulator into this one.
    pub fn merge(&mut self, other: &Statistics) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let (na, nb) = (self.count as f64, other.count as f64);
        let n = na + nb;
        let delta = other.mean - self.mean;
        self.mean += delta * nb / n;
        self.m2 += other.m2 + delta * delta * na * nb / n;
        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Number of values.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of values.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Smallest value, or 0 when empty.
    pub fn min(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.min
        }
    }

    /// Largest value, or 0 when empty.
    pub fn max(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.max
        }
    }

    /// Arithmetic mean, or 0 when empty.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance (n - 1 denominator), or 0 with fewer than two values.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Sample standard deviation.
    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let s = Statistics::new();
        assert_eq!(s.count(), 0);
        assert_eq!(s.mean(), 0.0);
        assert_eq!(s.min(), 0.0);
        assert_eq!(s.max(), 0.0);
        assert_eq!(s.stddev(), 0.0);
    }

    #[test]
    fn test_basic_moments() {
        let mut s = Statistics::new();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            s.push(v);
        }
        assert_eq!(s.count(), 8);
        assert_eq!(s.sum(), 40.0);
        assert!((s.mean() - 5.0).abs() < 1e-12);
        assert_eq!(s.min(), 2.0);
        assert_eq!(s.max(), 9.0);
        // Sample variance of this set is 32 / 7.
        assert!((s.variance() - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_value_has_zero_spread() {
        let mut s = Statistics::new();
        s.push(3.5);
        assert_eq!(s.variance(), 0.0);
        assert_eq!(s.min(), 3.5);
        assert_eq!(s.max(), 3.5);
    }

    #[test]
    fn test_merge_matches_single_stream() {
        let values = [1.0, 8.0, 3.0, 12.5, 0.25, 6.0];
        let mut all = Statistics::new();
        let mut left = Statistics::new();
        let mut right = Statistics::new();
        for (i, v) in values.iter().enumerate() {
            all.push(*v);
            if i % 2 == 0 {
                left.push(*v);
            } else {
                right.push(*v);
            }
        }
        left.merge(&right);
        assert_eq!(left.count(), all.count());
        assert_eq!(left.min(), all.min());
        assert_eq!(left.max(), all.max());
        assert!((left.mean() - all.mean()).abs() < 1e-12);
        assert!((left.variance() - all.variance()).abs() < 1e-9);
    }

    #[test]
    fn test_large_magnitude_keeps_spread() {
        let mut s = Statistics::new();
        for v in [1e9 + 1.0, 1e9 + 2.0, 1e9 + 3.0] {
            s.push(v);
        }
        assert_eq!(s.mean(), 1e9 + 2.0);
        assert!((s.variance() - 1.0).abs() < 1e-9);

        let mut left = Statistics::new();
        left.push(1e9 + 1.0);
        left.push(1e9 + 3.0);
        let mut right = Statistics::new();
        right.push(1e9 + 2.0);
        left.merge(&right);
        assert_eq!(left.count(), 3);
        assert!((left.variance() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_merge_into_empty() {
        let mut other = Statistics::new();
        other.push(2.0);
        other.push(6.0);
        let mut s = Statistics::new();
        s.merge(&other);
        assert_eq!(s, other);
        assert!((s.variance() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_merge_with_empty() {
        let mut s = Statistics::new();
        s.push(4.0);
        s.merge(&Statistics::new());
        assert_eq!(s.count(), 1);
        assert_eq!(s.min(), 4.0);
        assert_eq!(s.max(), 4.0);
    }
}
