//! Running accumulators folded one value at a time.
//!
//! Each accumulator holds O(1) state regardless of how many values it has seen, and only turns
//! that state into results when asked.

use serde::Serialize;

use crate::types::Metric;

/// Incremental reducer over values of type `V`.
pub trait Accumulator<V> {
    /// Fold one value into the running state.
    fn push(&mut self, value: V);
}

/// Two accumulators fed from one pass, e.g. `(Sum, Sum)` over `(profit, sales)` pairs.
impl<A, B, X, Y> Accumulator<(X, Y)> for (A, B)
where
    A: Accumulator<X>,
    B: Accumulator<Y>,
{
    fn push(&mut self, (x, y): (X, Y)) {
        self.0.push(x);
        self.1.push(y);
    }
}

/// Compensated (Neumaier) running sum.
///
/// Keeps the low-order bits a naive `+=` loses, so totals over many mixed-sign values of
/// different magnitudes stay accurate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sum {
    sum: f64,
    compensation: f64,
    count: u64,
}

impl Sum {
    /// Current total.
    pub fn total(&self) -> f64 {
        self.sum + self.compensation
    }

    /// Number of values folded in.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Accumulator<f64> for Sum {
    fn push(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
        self.count += 1;
    }
}

/// Running mean as compensated sum / count.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mean {
    sum: Sum,
}

impl Mean {
    /// Mean of the values seen, `None` before the first value.
    pub fn mean(&self) -> Option<f64> {
        match self.sum.count() {
            0 => None,
            n => Some(self.sum.total() / n as f64),
        }
    }

    /// Number of values folded in.
    pub fn count(&self) -> u64 {
        self.sum.count()
    }
}

impl Accumulator<f64> for Mean {
    fn push(&mut self, value: f64) {
        self.sum.push(value);
    }
}

/// Divisor used for variance and standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Variance {
    /// Divide by `n - 1` (Bessel's correction). Undefined for a single value.
    #[default]
    Sample,
    /// Divide by `n`.
    Population,
}

/// Count, sum, min, max, mean and variance in one pass (Welford's algorithm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
    sum: Sum,
}

impl Default for RunningStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: Sum::default(),
        }
    }
}

impl RunningStats {
    /// Number of values folded in.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Running mean, `None` before the first value.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Smallest value seen.
    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    /// Largest value seen.
    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    /// Variance with the requested divisor.
    ///
    /// [`Metric::InsufficientData`] when the divisor would be zero (no values, or one value under
    /// [`Variance::Sample`]).
    pub fn variance(&self, variance: Variance) -> Metric {
        let divisor = match variance {
            Variance::Sample => self.count.saturating_sub(1),
            Variance::Population => self.count,
        };
        if divisor == 0 {
            Metric::InsufficientData
        } else {
            // m2 can dip a hair below zero from rounding on constant input.
            Metric::Value((self.m2 / divisor as f64).max(0.0))
        }
    }

    /// Standard deviation with the requested divisor; same sentinel rules as [`Self::variance`].
    pub fn std_dev(&self, variance: Variance) -> Metric {
        match self.variance(variance) {
            Metric::Value(v) => Metric::Value(v.sqrt()),
            other => other,
        }
    }

    /// Finalize into a [`Summary`]; `None` if no value was pushed.
    pub fn summary(&self, variance: Variance) -> Option<Summary> {
        let mean = self.mean()?;
        Some(Summary {
            count: self.count,
            sum: self.sum.total(),
            mean,
            min: self.min,
            max: self.max,
            std_dev: self.std_dev(variance),
        })
    }
}

impl Accumulator<f64> for RunningStats {
    fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum.push(value);
    }
}

/// Finalized descriptive statistics for one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    /// Number of values; always at least 1.
    pub count: u64,
    /// Compensated total.
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Standard deviation with the divisor the summary was built with.
    pub std_dev: Metric,
}

#[cfg(test)]
mod tests {
    use super::{Accumulator, Mean, RunningStats, Sum, Variance};
    use crate::types::Metric;

    fn stats_of(values: &[f64]) -> RunningStats {
        let mut s = RunningStats::default();
        for v in values {
            s.push(*v);
        }
        s
    }

    #[test]
    fn compensated_sum_keeps_small_terms() {
        let mut s = Sum::default();
        for v in [1e16, 1.0, -1e16, 1.0] {
            s.push(v);
        }
        assert_eq!(s.total(), 2.0);
        assert_eq!(s.count(), 4);
    }

    #[test]
    fn mean_is_none_until_first_value() {
        let mut m = Mean::default();
        assert_eq!(m.mean(), None);
        m.push(10.0);
        m.push(20.0);
        assert_eq!(m.mean(), Some(15.0));
        assert_eq!(m.count(), 2);
    }

    #[test]
    fn sample_and_population_divisors() {
        // 100, 200 -> mean 150, squared deviations sum to 5000.
        let s = stats_of(&[100.0, 200.0]);
        assert_eq!(s.variance(Variance::Population), Metric::Value(2500.0));
        assert_eq!(s.std_dev(Variance::Population), Metric::Value(50.0));
        assert_eq!(s.variance(Variance::Sample), Metric::Value(5000.0));
    }

    #[test]
    fn single_value_sample_std_dev_is_insufficient_data() {
        let s = stats_of(&[42.0]);
        assert_eq!(s.std_dev(Variance::Sample), Metric::InsufficientData);
        assert_eq!(s.std_dev(Variance::Population), Metric::Value(0.0));
    }

    #[test]
    fn summary_tracks_extremes_and_sum() {
        let summary = stats_of(&[10.0, -5.0, 30.0]).summary(Variance::Sample).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.sum, 35.0);
        assert_eq!(summary.min, -5.0);
        assert_eq!(summary.max, 30.0);
        assert!((summary.mean - 35.0 / 3.0).abs() < 1e-12);
        assert!(RunningStats::default().summary(Variance::Sample).is_none());
    }

    #[test]
    fn pair_accumulator_feeds_both_sides() {
        let mut pair = (Sum::default(), Mean::default());
        pair.push((2.0, 4.0));
        pair.push((3.0, 8.0));
        assert_eq!(pair.0.total(), 5.0);
        assert_eq!(pair.1.mean(), Some(6.0));
    }
}
