//! A serializable snapshot of every query over one source.

use serde::Serialize;

use crate::error::AnalyticsResult;
use crate::processing::{Summary, Variance};
use crate::source::StreamReport;
use crate::types::Metric;

use super::keys::{CategorySubCategory, MarketCategory, YearMarketCategory};
use super::{DiscountImpact, FulfillmentSummary, OrderAnalytics, QueryOutput, RankedMargin, YearTrend};

/// Total sales of one `(year, market, category)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRow {
    #[serde(flatten)]
    pub key: YearMarketCategory,
    pub sales: f64,
}

/// One year of one `(market, category)` trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    #[serde(flatten)]
    pub key: MarketCategory,
    #[serde(flatten)]
    pub trend: YearTrend,
}

/// Profit margin of one `(category, sub_category)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginRow {
    #[serde(flatten)]
    pub key: CategorySubCategory,
    pub margin: Metric,
}

/// Profit statistics of one `(market, category)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolatilityRow {
    #[serde(flatten)]
    pub key: MarketCategory,
    #[serde(flatten)]
    pub profit: Summary,
}

/// The stream bookkeeping of one query pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryReport {
    pub query: &'static str,
    #[serde(flatten)]
    pub report: StreamReport,
}

/// Every query's result as flat rows, sorted by key so two runs over the same data serialize
/// identically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub sales_by_year_market_category: Vec<SalesRow>,
    pub yoy_category_trends: Vec<TrendRow>,
    pub profit_margins: Vec<MarginRow>,
    pub top_margins: Vec<RankedMargin>,
    pub discount_impact: DiscountImpact,
    pub fulfillment: FulfillmentSummary,
    pub profit_volatility: Vec<VolatilityRow>,
    pub streams: Vec<QueryReport>,
}

impl AnalyticsSummary {
    /// Pretty-printed JSON; undefined metrics serialize as strings.
    pub fn to_json_pretty(&self) -> AnalyticsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

struct Tracked<'a>(&'a mut Vec<QueryReport>);

impl Tracked<'_> {
    fn take<T>(&mut self, query: &'static str, output: QueryOutput<T>) -> T {
        self.0.push(QueryReport {
            query,
            report: output.report,
        });
        output.value
    }
}

impl OrderAnalytics {
    /// Run all seven queries (one pass each) and collect the results.
    ///
    /// Volatility uses [`Variance::Sample`]. Fails on the first query that fails.
    pub fn summarize(&self, top_n: usize) -> AnalyticsResult<AnalyticsSummary> {
        let mut streams = Vec::with_capacity(7);
        let mut track = Tracked(&mut streams);

        let top_margins = track.take("top_categories_by_margin", self.top_categories_by_margin(top_n)?);

        let mut sales: Vec<SalesRow> = track.take("sales_by_year_market_category", self.sales_by_year_market_category()?)
            .into_iter()
            .map(|(key, sales)| SalesRow { key, sales })
            .collect();
        sales.sort_by(|a, b| a.key.cmp(&b.key));

        let mut trends: Vec<TrendRow> = track.take("yoy_category_trends", self.yoy_category_trends()?)
            .into_iter()
            .flat_map(|(key, years)| {
                years.into_iter().map(move |trend| TrendRow {
                    key: key.clone(),
                    trend,
                })
            })
            .collect();
        trends.sort_by(|a, b| a.key.cmp(&b.key).then(a.trend.year.cmp(&b.trend.year)));

        let mut margins: Vec<MarginRow> = track.take(
            "profit_margin_by_category_subcategory",
            self.profit_margin_by_category_subcategory()?,
        )
        .into_iter()
        .map(|(key, margin)| MarginRow { key, margin })
        .collect();
        margins.sort_by(|a, b| a.key.cmp(&b.key));

        let discount_impact = track.take("discounted_profit", self.discounted_profit()?);
        let fulfillment = track.take("average_fulfillment_days", self.average_fulfillment_days()?);

        let mut volatility: Vec<VolatilityRow> = track.take(
            "profit_volatility_by_market_category",
            self.profit_volatility_by_market_category(Variance::Sample)?,
        )
        .into_iter()
        .map(|(key, profit)| VolatilityRow { key, profit })
        .collect();
        volatility.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(AnalyticsSummary {
            sales_by_year_market_category: sales,
            yoy_category_trends: trends,
            profit_margins: margins,
            top_margins,
            discount_impact,
            fulfillment,
            profit_volatility: volatility,
            streams,
        })
    }
}
