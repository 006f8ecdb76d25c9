//! Streaming aggregation primitives.
//!
//! The processing layer folds any iterator of items into per-key running statistics without
//! buffering the items themselves. The analytical queries in [`crate::analytics`] are thin
//! configurations of these functions.
//!
//! - [`accumulate`]: the [`Accumulator`] trait and the [`Sum`], [`Mean`] and [`RunningStats`]
//!   accumulators
//! - [`group`]: [`fold_by_key`] and the ready-made [`sum_by_key`], [`mean_by_key`],
//!   [`stddev_by_key`] and [`stats_by_key`]
//! - [`top`]: bounded [`top_n_by`] selection
//!
//! ## Example: one pass, two statistics
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use order_analytics::processing::{fold_by_key, Sum};
//! use order_analytics::types::Metric;
//!
//! // (category, profit, sales)
//! let rows = [("Chairs", 20.0, 100.0), ("Chairs", 15.0, 150.0), ("Binders", 0.0, 0.0)];
//!
//! let sums: HashMap<&str, (Sum, Sum)> = fold_by_key(rows, |r| r.0, |r| (r.1, r.2));
//! let margin = |k: &str| {
//!     let (profit, sales) = &sums[k];
//!     Metric::ratio(profit.total(), sales.total())
//! };
//! assert_eq!(margin("Chairs"), Metric::Value(0.14));
//! assert_eq!(margin("Binders"), Metric::Undefined);
//! ```

pub mod accumulate;
pub mod group;
pub mod top;

pub use accumulate::{Accumulator, Mean, RunningStats, Sum, Summary, Variance};
pub use group::{fold_by_key, mean_by_key, stats_by_key, stddev_by_key, sum_by_key};
pub use top::top_n_by;
