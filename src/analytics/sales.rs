//! Sales totals and year-over-year trends.

use std::collections::{BTreeMap, HashMap};

use itertools::process_results;
use serde::Serialize;

use crate::error::AnalyticsResult;
use crate::processing::sum_by_key;
use crate::types::{Metric, Order};

use super::keys::{MarketCategory, YearMarketCategory};

/// Total sales per `(year, market, category)`.
pub fn sales_by_year_market_category<I>(orders: I) -> AnalyticsResult<HashMap<YearMarketCategory, f64>>
where
    I: IntoIterator<Item = AnalyticsResult<Order>>,
{
    process_results(orders, |orders| {
        sum_by_key(orders, YearMarketCategory::of, |o| o.sales)
    })
}

/// One year of a `(market, category)` sales trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTrend {
    pub year: i32,
    pub sales: f64,
    /// The closest earlier year with sales for the same key, if any.
    pub previous_year: Option<i32>,
    pub previous_sales: Option<f64>,
    /// Percent change from `previous_sales`. [`Metric::InsufficientData`] for the first year,
    /// [`Metric::Undefined`] when the previous year's total is zero.
    pub change_pct: Metric,
}

/// Build the trend for one key from its per-year totals.
///
/// Years are compared with the previous year *present*, so a gap (2021, 2023) compares 2023
/// against 2021.
pub fn year_trends(sales_by_year: &BTreeMap<i32, f64>) -> Vec<YearTrend> {
    let mut previous: Option<(i32, f64)> = None;
    sales_by_year
        .iter()
        .map(|(&year, &sales)| {
            let change_pct = match previous {
                Some((_, prev)) => Metric::percent_change(prev, sales),
                None => Metric::InsufficientData,
            };
            let trend = YearTrend {
                year,
                sales,
                previous_year: previous.map(|(y, _)| y),
                previous_sales: previous.map(|(_, s)| s),
                change_pct,
            };
            previous = Some((year, sales));
            trend
        })
        .collect()
}

/// Year-over-year sales change per `(market, category)`, oldest year first.
///
/// One pass folds sales per `(market, category, year)`; the trend is derived from those totals,
/// so memory is bounded by the number of distinct keys times years.
pub fn yoy_category_trends<I>(orders: I) -> AnalyticsResult<HashMap<MarketCategory, Vec<YearTrend>>>
where
    I: IntoIterator<Item = AnalyticsResult<Order>>,
{
    let totals = process_results(orders, |orders| {
        sum_by_key(orders, |o| (MarketCategory::of(o), o.year()), |o| o.sales)
    })?;

    let mut by_key: HashMap<MarketCategory, BTreeMap<i32, f64>> = HashMap::new();
    for ((key, year), sales) in totals {
        by_key.entry(key).or_default().insert(year, sales);
    }

    Ok(by_key
        .into_iter()
        .map(|(key, years)| (key, year_trends(&years)))
        .collect())
}
