//! Profit volatility per `(market, category)`.

use std::collections::HashMap;

use itertools::process_results;

use crate::error::AnalyticsResult;
use crate::processing::{stats_by_key, Summary, Variance};
use crate::types::Order;

use super::keys::MarketCategory;

/// Standard deviation, min, max, mean and count of `profit` per `(market, category)`.
///
/// A group with a single order has `std_dev` of [`crate::types::Metric::InsufficientData`] under
/// [`Variance::Sample`].
pub fn profit_volatility_by_market_category<I>(
    orders: I,
    variance: Variance,
) -> AnalyticsResult<HashMap<MarketCategory, Summary>>
where
    I: IntoIterator<Item = AnalyticsResult<Order>>,
{
    process_results(orders, |orders| {
        stats_by_key(orders, MarketCategory::of, |o| o.profit, variance)
    })
}
