//! Days from order to shipment.

use itertools::process_results;
use serde::Serialize;

use crate::error::AnalyticsResult;
use crate::processing::{fold_by_key, Mean};
use crate::types::{Metric, Order};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Shipment {
    Shipped,
    BeforeOrdered,
    Missing,
}

impl Shipment {
    fn of(order: &Order) -> Self {
        match order.fulfillment_days() {
            Some(days) if days >= 0 => Self::Shipped,
            Some(_) => Self::BeforeOrdered,
            None => Self::Missing,
        }
    }
}

/// Mean fulfillment time plus the data-quality counts of orders left out of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FulfillmentSummary {
    /// Mean whole days from order to shipment. [`Metric::InsufficientData`] when no order
    /// qualifies.
    pub mean_days: Metric,
    /// Orders contributing to the mean.
    pub included: u64,
    /// Orders whose ship date precedes the order date; excluded from the mean.
    pub shipped_before_ordered: u64,
    /// Orders without a ship date; excluded from the mean.
    pub missing_ship_date: u64,
}

/// Average fulfillment days over orders shipped on or after their order date.
pub fn average_fulfillment_days<I>(orders: I) -> AnalyticsResult<FulfillmentSummary>
where
    I: IntoIterator<Item = AnalyticsResult<Order>>,
{
    let groups = process_results(orders, |orders| {
        fold_by_key::<_, _, _, Mean, _, _, _>(orders, Shipment::of, |o| {
            o.fulfillment_days().unwrap_or_default() as f64
        })
    })?;

    let count = |class: Shipment| groups.get(&class).map_or(0, Mean::count);
    let mean_days = groups
        .get(&Shipment::Shipped)
        .and_then(Mean::mean)
        .map_or(Metric::InsufficientData, Metric::Value);

    Ok(FulfillmentSummary {
        mean_days,
        included: count(Shipment::Shipped),
        shipped_before_ordered: count(Shipment::BeforeOrdered),
        missing_ship_date: count(Shipment::Missing),
    })
}
