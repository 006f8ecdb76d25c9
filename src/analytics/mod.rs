//! The analytical queries.
//!
//! Every query is a plain function over an iterator of `AnalyticsResult<Order>`, so it works on
//! any stream produced by [`crate::source`] (or on a hand-built iterator in tests). A fail-fast
//! parse error in the stream short-circuits the query and is returned as-is.
//!
//! [`OrderAnalytics`] binds a source and its options together and opens a fresh stream for every
//! query call, returning the query's value alongside that stream's [`StreamReport`].
//!
//! ```rust
//! use std::io::Cursor;
//!
//! use order_analytics::analytics::{profit_margin_by_category_subcategory, CategorySubCategory};
//! use order_analytics::source::{stream_orders_from_reader, StreamOptions};
//! use order_analytics::types::Metric;
//!
//! let csv = "Order Date,Ship Date,Market,Category,Sub-Category,Sales,Profit,Discount\n\
//!            01/02/2023,01/05/2023,US,Furniture,Chairs,100,20,0\n\
//!            01/03/2023,01/04/2023,US,Office Supplies,Binders,0,0,0\n";
//! let stream = stream_orders_from_reader(Cursor::new(csv), &StreamOptions::default())?;
//! let margins = profit_margin_by_category_subcategory(stream)?;
//!
//! assert_eq!(margins[&CategorySubCategory::new("Furniture", "Chairs")], Metric::Value(0.2));
//! assert_eq!(margins[&CategorySubCategory::new("Office Supplies", "Binders")], Metric::Undefined);
//! # Ok::<(), order_analytics::AnalyticsError>(())
//! ```

pub mod discount;
pub mod fulfillment;
pub mod keys;
pub mod margin;
pub mod report;
pub mod sales;
pub mod volatility;

use std::collections::HashMap;

use crate::error::AnalyticsResult;
use crate::processing::{Summary, Variance};
use crate::source::{stream_orders, FileOrderStream, OrderSource, StreamOptions, StreamReport};
use crate::types::Metric;

pub use discount::{discounted_profit, DiscountImpact};
pub use fulfillment::{average_fulfillment_days, FulfillmentSummary};
pub use keys::{CategorySubCategory, MarketCategory, YearMarketCategory};
pub use margin::{profit_margin_by_category_subcategory, top_categories_by_margin, RankedMargin};
pub use report::AnalyticsSummary;
pub use sales::{sales_by_year_market_category, year_trends, yoy_category_trends, YearTrend};
pub use volatility::profit_volatility_by_market_category;

/// A query result plus the bookkeeping of the stream it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutput<T> {
    /// The query's answer.
    pub value: T,
    /// Row counts and skipped rows of the pass that produced `value`.
    pub report: StreamReport,
}

/// Runs the analytical queries against one [`OrderSource`].
///
/// Holds no stream state between calls: each query opens the source, exhausts it and closes it,
/// so calling the same query twice reads the data twice and returns the same result.
#[derive(Debug, Clone)]
pub struct OrderAnalytics {
    source: OrderSource,
    options: StreamOptions,
}

impl OrderAnalytics {
    /// Bind `source` and the options every query will stream it with. Nothing is opened yet.
    pub fn new(source: impl Into<OrderSource>, options: StreamOptions) -> Self {
        Self {
            source: source.into(),
            options,
        }
    }

    /// The source each query reads.
    pub fn source(&self) -> &OrderSource {
        &self.source
    }

    /// The stream options each query uses.
    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    fn run<T>(
        &self,
        query: &'static str,
        f: impl FnOnce(&mut FileOrderStream) -> AnalyticsResult<T>,
    ) -> AnalyticsResult<QueryOutput<T>> {
        let mut stream = stream_orders(&self.source, &self.options)?;
        let value = f(&mut stream)?;
        let report = stream.report();
        tracing::info!(
            query,
            rows = report.rows_read,
            skipped = report.rows_skipped,
            warnings = report.warnings,
            "query complete"
        );
        Ok(QueryOutput { value, report })
    }

    /// See [`sales_by_year_market_category`].
    pub fn sales_by_year_market_category(&self) -> AnalyticsResult<QueryOutput<HashMap<YearMarketCategory, f64>>> {
        self.run("sales_by_year_market_category", |s| sales_by_year_market_category(s))
    }

    /// See [`yoy_category_trends`].
    pub fn yoy_category_trends(&self) -> AnalyticsResult<QueryOutput<HashMap<MarketCategory, Vec<YearTrend>>>> {
        self.run("yoy_category_trends", |s| yoy_category_trends(s))
    }

    /// See [`profit_margin_by_category_subcategory`].
    pub fn profit_margin_by_category_subcategory(
        &self,
    ) -> AnalyticsResult<QueryOutput<HashMap<CategorySubCategory, Metric>>> {
        self.run("profit_margin_by_category_subcategory", |s| {
            profit_margin_by_category_subcategory(s)
        })
    }

    /// See [`top_categories_by_margin`]. `n == 0` fails without opening the source.
    pub fn top_categories_by_margin(&self, n: usize) -> AnalyticsResult<QueryOutput<Vec<RankedMargin>>> {
        margin::ensure_top_n(n)?;
        self.run("top_categories_by_margin", |s| top_categories_by_margin(s, n))
    }

    /// See [`discounted_profit`].
    pub fn discounted_profit(&self) -> AnalyticsResult<QueryOutput<DiscountImpact>> {
        self.run("discounted_profit", |s| discounted_profit(s))
    }

    /// See [`average_fulfillment_days`].
    pub fn average_fulfillment_days(&self) -> AnalyticsResult<QueryOutput<FulfillmentSummary>> {
        self.run("average_fulfillment_days", |s| average_fulfillment_days(s))
    }

    /// See [`profit_volatility_by_market_category`].
    pub fn profit_volatility_by_market_category(
        &self,
        variance: Variance,
    ) -> AnalyticsResult<QueryOutput<HashMap<MarketCategory, Summary>>> {
        self.run("profit_volatility_by_market_category", |s| {
            profit_volatility_by_market_category(s, variance)
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;

    use crate::types::{Order, OrderDetails};

    pub(crate) fn order(
        market: &str,
        category: &str,
        sub_category: &str,
        sales: f64,
        profit: f64,
        discount: f64,
    ) -> Order {
        Order {
            order_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            ship_date: NaiveDate::from_ymd_opt(2023, 1, 3),
            market: market.to_string(),
            category: category.to_string(),
            sub_category: sub_category.to_string(),
            sales,
            profit,
            discount,
            quantity: Some(1),
            details: OrderDetails::default(),
        }
    }

    pub(crate) fn dated(mut order: Order, ordered: (i32, u32, u32), shipped: Option<(i32, u32, u32)>) -> Order {
        let date = |(y, m, d): (i32, u32, u32)| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        order.order_date = date(ordered);
        order.ship_date = shipped.map(date);
        order
    }
}
