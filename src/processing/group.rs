//! Key-based folding: one accumulator per distinct key, one pass over the input.
//!
//! Every function here takes a key extractor and a value extractor and visits each item exactly
//! once. Memory is bounded by the number of distinct keys, never by the number of items.
//!
//! ```rust
//! use order_analytics::processing::{stats_by_key, sum_by_key, Variance};
//! use order_analytics::types::Metric;
//!
//! let rows = [("US", 100.0), ("EU", 40.0), ("US", 50.0)];
//!
//! let sums = sum_by_key(rows, |r| r.0, |r| r.1);
//! assert_eq!(sums["US"], 150.0);
//!
//! let stats = stats_by_key(rows, |r| r.0, |r| r.1, Variance::Sample);
//! assert_eq!(stats["US"].count, 2);
//! assert_eq!(stats["EU"].std_dev, Metric::InsufficientData);
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use crate::types::Metric;

use super::accumulate::{Accumulator, Mean, RunningStats, Sum, Summary, Variance};

/// Fold every item into the accumulator for its key.
///
/// `A` is any [`Accumulator`] over the extracted value; a tuple of accumulators folds a tuple of
/// values in the same pass.
pub fn fold_by_key<T, K, V, A, I, KF, VF>(items: I, mut key_fn: KF, mut value_fn: VF) -> HashMap<K, A>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash,
    A: Accumulator<V> + Default,
    KF: FnMut(&T) -> K,
    VF: FnMut(&T) -> V,
{
    let mut groups: HashMap<K, A> = HashMap::new();
    for item in items {
        let value = value_fn(&item);
        groups.entry(key_fn(&item)).or_default().push(value);
    }
    groups
}

/// Compensated sum per key.
pub fn sum_by_key<T, K, I, KF, VF>(items: I, key_fn: KF, value_fn: VF) -> HashMap<K, f64>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash,
    KF: FnMut(&T) -> K,
    VF: FnMut(&T) -> f64,
{
    fold_by_key::<T, K, f64, Sum, I, KF, VF>(items, key_fn, value_fn)
        .into_iter()
        .map(|(k, acc)| (k, acc.total()))
        .collect()
}

/// Mean per key. Every key present has at least one value, so the mean is always defined.
pub fn mean_by_key<T, K, I, KF, VF>(items: I, key_fn: KF, value_fn: VF) -> HashMap<K, f64>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash,
    KF: FnMut(&T) -> K,
    VF: FnMut(&T) -> f64,
{
    fold_by_key::<T, K, f64, Mean, I, KF, VF>(items, key_fn, value_fn)
        .into_iter()
        .filter_map(|(k, acc)| acc.mean().map(|m| (k, m)))
        .collect()
}

/// Standard deviation per key.
///
/// With [`Variance::Sample`] a single-item group maps to [`Metric::InsufficientData`].
pub fn stddev_by_key<T, K, I, KF, VF>(
    items: I,
    key_fn: KF,
    value_fn: VF,
    variance: Variance,
) -> HashMap<K, Metric>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash,
    KF: FnMut(&T) -> K,
    VF: FnMut(&T) -> f64,
{
    fold_by_key::<T, K, f64, RunningStats, I, KF, VF>(items, key_fn, value_fn)
        .into_iter()
        .map(|(k, acc)| (k, acc.std_dev(variance)))
        .collect()
}

/// Count, sum, mean, min, max and standard deviation per key.
pub fn stats_by_key<T, K, I, KF, VF>(
    items: I,
    key_fn: KF,
    value_fn: VF,
    variance: Variance,
) -> HashMap<K, Summary>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash,
    KF: FnMut(&T) -> K,
    VF: FnMut(&T) -> f64,
{
    fold_by_key::<T, K, f64, RunningStats, I, KF, VF>(items, key_fn, value_fn)
        .into_iter()
        .filter_map(|(k, acc)| acc.summary(variance).map(|s| (k, s)))
        .collect()
}
