//! Profit earned on discounted orders.

use itertools::process_results;
use serde::Serialize;

use crate::error::AnalyticsResult;
use crate::processing::{fold_by_key, Sum};
use crate::types::{Metric, Order};

/// Profit on discounted orders and its share of all profit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiscountImpact {
    /// Sum of `profit` over orders with `discount > 0`.
    pub discounted_profit: f64,
    /// Sum of `profit` over all orders.
    pub total_profit: f64,
    /// `discounted_profit / total_profit`; [`Metric::Undefined`] when total profit is zero.
    pub share: Metric,
    pub discounted_orders: u64,
    pub total_orders: u64,
}

/// Discounted profit total and share, in one pass.
pub fn discounted_profit<I>(orders: I) -> AnalyticsResult<DiscountImpact>
where
    I: IntoIterator<Item = AnalyticsResult<Order>>,
{
    let groups = process_results(orders, |orders| {
        fold_by_key::<_, _, _, Sum, _, _, _>(orders, Order::is_discounted, |o| o.profit)
    })?;

    let discounted = groups.get(&true).copied().unwrap_or_default();
    let full_price = groups.get(&false).copied().unwrap_or_default();
    let total_profit = discounted.total() + full_price.total();

    Ok(DiscountImpact {
        discounted_profit: discounted.total(),
        total_profit,
        share: Metric::ratio(discounted.total(), total_profit),
        discounted_orders: discounted.count(),
        total_orders: discounted.count() + full_price.count(),
    })
}
