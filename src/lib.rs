//! `order-analytics` computes sales and profit analytics over e-commerce order CSVs without
//! loading the dataset into memory.
//!
//! Rows are parsed into validated [`types::Order`]s one at a time by a lazy, single-pass stream
//! ([`source::stream_orders`]), folded into per-key running statistics by the generic reducers in
//! [`processing`], and turned into answers by the queries in [`analytics`].
//!
//! ## What a source looks like
//!
//! Comma-separated text with a header row. Columns are found by name, in any order; header
//! matching ignores case, spaces and punctuation, so `Sub-Category`, `sub_category` and
//! `Sub.Category` all name the same column.
//!
//! **Required:** Order Date, Ship Date, Market (or Region), Category, Sub-Category, Sales, Profit,
//! Discount.
//!
//! **Optional:** Quantity, Order ID, Customer ID, Customer Name, Country, State, Product ID,
//! Product Name, Shipping Cost.
//!
//! Dates use one configured format (`MM/DD/YYYY` by default); a blank Ship Date means "not
//! shipped". Rows that fail to parse are skipped and logged by default, or abort the stream under
//! [`source::ParseErrorPolicy::FailFast`].
//!
//! ## Quick example: run a query over a file
//!
//! ```no_run
//! use order_analytics::analytics::OrderAnalytics;
//! use order_analytics::source::StreamOptions;
//!
//! # fn main() -> Result<(), order_analytics::AnalyticsError> {
//! let analytics = OrderAnalytics::new("data/orders.csv", StreamOptions::default());
//! let top = analytics.top_categories_by_margin(5)?;
//! for entry in &top.value {
//!     println!("{}. {} {:.3}", entry.rank, entry.key, entry.margin);
//! }
//! println!("skipped rows: {}", top.report.rows_skipped);
//! # Ok(())
//! # }
//! ```
//!
//! ## Streaming example
//!
//! ```rust
//! use std::io::Cursor;
//!
//! use order_analytics::analytics::{sales_by_year_market_category, YearMarketCategory};
//! use order_analytics::source::{stream_orders_from_reader, StreamOptions};
//!
//! let csv = "Category,Sub-Category,Market,Order Date,Ship Date,Sales,Profit,Discount\n\
//!            Furniture,Chairs,US,01/02/2023,01/05/2023,100.5,20,0\n\
//!            Furniture,Tables,US,07/14/2023,07/20/2023,49.5,-3,0.2\n\
//!            Furniture,Tables,US,not-a-date,07/20/2023,10,1,0\n";
//!
//! let mut stream = stream_orders_from_reader(Cursor::new(csv), &StreamOptions::default()).unwrap();
//! let sales = sales_by_year_market_category(stream.by_ref()).unwrap();
//!
//! assert_eq!(sales[&YearMarketCategory::new(2023, "US", "Furniture")], 150.0);
//! assert_eq!(stream.report().rows_skipped, 1);
//! ```
//!
//! ## Modules
//!
//! - [`source`]: order streams, the row parser, options and observability hooks
//! - [`processing`]: accumulators and group-by folding primitives
//! - [`analytics`]: the seven queries, their key types and the [`analytics::OrderAnalytics`] facade
//! - [`types`]: the [`types::Order`] record and the [`types::Metric`] result value
//! - [`error`]: error types

pub mod analytics;
pub mod error;
pub mod processing;
pub mod source;
pub mod types;

pub use error::{AnalyticsError, AnalyticsResult, ParseError};
