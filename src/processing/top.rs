//! Bounded top-N selection.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::error::{AnalyticsError, AnalyticsResult};

/// Heap entry: a higher score ranks higher, and on equal scores the smaller item ranks higher.
struct Ranked<T> {
    score: f64,
    item: T,
}

impl<T: Ord> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.item.cmp(&self.item))
    }
}

impl<T: Ord> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: Ord> Eq for Ranked<T> {}

/// Select the `n` keys with the highest score, best first.
///
/// Holds at most `n` entries at any time (a min-heap of the current best), so selecting from `m`
/// candidates costs `O(m log n)` and never sorts the full input. Entries whose score is `None`, or
/// NaN, are not ranked. Equal scores are broken by ascending key order, so the result is
/// reproducible regardless of input order.
///
/// Returns [`AnalyticsError::AggregationPolicy`] when `n == 0`.
///
/// ```rust
/// use order_analytics::processing::top_n_by;
///
/// let margins = [("Chairs", 0.1), ("Phones", 0.5), ("Tables", 0.3), ("Art", 0.3)];
/// let top = top_n_by(margins, 2, |m| Some(*m)).unwrap();
/// assert_eq!(top, vec![("Phones", 0.5), ("Art", 0.3)]);
/// ```
pub fn top_n_by<K, S, I, F>(entries: I, n: usize, mut score_fn: F) -> AnalyticsResult<Vec<(K, f64)>>
where
    K: Ord,
    I: IntoIterator<Item = (K, S)>,
    F: FnMut(&S) -> Option<f64>,
{
    if n == 0 {
        return Err(AnalyticsError::policy("top-N requires n >= 1"));
    }

    let mut heap: BinaryHeap<Reverse<Ranked<K>>> = BinaryHeap::with_capacity(n + 1);
    for (key, value) in entries {
        let Some(score) = score_fn(&value).filter(|s| !s.is_nan()) else {
            continue;
        };
        let candidate = Ranked { score, item: key };
        if heap.len() < n {
            heap.push(Reverse(candidate));
        } else if heap.peek().is_some_and(|Reverse(worst)| candidate > *worst) {
            heap.pop();
            heap.push(Reverse(candidate));
        }
    }

    Ok(heap
        .into_sorted_vec()
        .into_iter()
        .map(|Reverse(r)| (r.item, r.score))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::top_n_by;
    use crate::error::AnalyticsError;

    #[test]
    fn keeps_the_highest_scores_best_first() {
        let top = top_n_by([("c", 0.1), ("a", 0.5), ("b", 0.3)], 2, |s| Some(*s)).unwrap();
        assert_eq!(top, vec![("a", 0.5), ("b", 0.3)]);
    }

    #[test]
    fn ties_break_by_ascending_key_regardless_of_input_order() {
        let forward = top_n_by([("d", ()), ("c", ()), ("b", ()), ("a", ())], 2, |_| Some(1.0)).unwrap();
        let backward = top_n_by([("a", ()), ("b", ()), ("c", ()), ("d", ())], 2, |_| Some(1.0)).unwrap();
        assert_eq!(forward, vec![("a", 1.0), ("b", 1.0)]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn unscored_and_nan_entries_are_skipped() {
        let entries = [(1, None), (2, Some(f64::NAN)), (3, Some(3.0)), (4, Some(4.0))];
        let top = top_n_by(entries, 3, |s| *s).unwrap();
        assert_eq!(top, vec![(4, 4.0), (3, 3.0)]);
    }

    #[test]
    fn negative_scores_rank_below_positive() {
        let top = top_n_by([("x", -0.1), ("y", 0.0), ("z", 0.2)], 5, |s| Some(*s)).unwrap();
        let keys: Vec<_> = top.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["z", "y", "x"]);
    }

    #[test]
    fn zero_n_is_a_policy_error() {
        let err = top_n_by([(1, 1.0)], 0, |s| Some(*s)).unwrap_err();
        assert!(matches!(err, AnalyticsError::AggregationPolicy { .. }));
    }
}
