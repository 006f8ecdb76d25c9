//! Core data model: the [`Order`] record produced by the parser and the [`Metric`] value used for
//! derived results that may be undefined.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

/// One order line, parsed and validated.
///
/// Constructed once per source row and never mutated afterwards. Orders are folded into
/// aggregates and dropped; nothing in the crate retains them past a single pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    /// Date the order was placed.
    pub order_date: NaiveDate,
    /// Date the order shipped, if known. Not guaranteed to be on or after `order_date`.
    pub ship_date: Option<NaiveDate>,
    /// Market (or region) the order belongs to.
    pub market: String,
    /// Product category.
    pub category: String,
    /// Product sub-category within `category`.
    pub sub_category: String,
    /// Sales amount.
    pub sales: f64,
    /// Profit amount; may be negative.
    pub profit: f64,
    /// Fractional discount in `[0, 1]`.
    pub discount: f64,
    /// Units ordered, when the source carries a quantity column.
    pub quantity: Option<u32>,
    /// Descriptive columns that no query depends on.
    pub details: OrderDetails,
}

/// Optional descriptive columns, filled in when the source has them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderDetails {
    /// `Order ID`.
    pub order_id: Option<String>,
    /// `Customer ID`.
    pub customer_id: Option<String>,
    /// `Customer Name`.
    pub customer_name: Option<String>,
    /// `Country`.
    pub country: Option<String>,
    /// `State`.
    pub state: Option<String>,
    /// `Product ID`.
    pub product_id: Option<String>,
    /// `Product Name`.
    pub product_name: Option<String>,
    /// `Shipping Cost`; must be a finite number when present.
    pub shipping_cost: Option<f64>,
}

impl Order {
    /// Calendar year of `order_date`.
    pub fn year(&self) -> i32 {
        self.order_date.year()
    }

    /// Whether any discount was applied.
    pub fn is_discounted(&self) -> bool {
        self.discount > 0.0
    }

    /// Whole days between order and shipment.
    ///
    /// Negative when the ship date precedes the order date; `None` when the order has no ship
    /// date.
    pub fn fulfillment_days(&self) -> Option<i64> {
        self.ship_date
            .map(|shipped| shipped.signed_duration_since(self.order_date).num_days())
    }
}

/// A derived numeric result that is not always defined.
///
/// Ratios, percentage changes and sample statistics can lack a meaningful value. Those cases are
/// reported explicitly rather than as `0.0`, so a renderer can tell "no data" apart from a real
/// zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    /// A computed value.
    Value(f64),
    /// The denominator was zero.
    Undefined,
    /// Too few observations (a single-sample standard deviation, a first year with nothing to
    /// compare against, an empty group).
    InsufficientData,
}

impl Metric {
    /// `numerator / denominator`, or [`Metric::Undefined`] when the denominator is zero.
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            Self::Undefined
        } else {
            Self::Value(numerator / denominator)
        }
    }

    /// Percentage change from `previous` to `current`, [`Metric::Undefined`] when `previous` is
    /// zero.
    pub fn percent_change(previous: f64, current: f64) -> Self {
        match Self::ratio(current - previous, previous) {
            Self::Value(v) => Self::Value(v * 100.0),
            other => other,
        }
    }

    /// The numeric value, if defined.
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Undefined | Self::InsufficientData => None,
        }
    }

    /// Returns `true` for [`Metric::Value`].
    pub fn is_defined(self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Undefined => f.write_str("undefined"),
            Self::InsufficientData => f.write_str("insufficient data"),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_f64(*v),
            Self::Undefined => serializer.serialize_str("undefined"),
            Self::InsufficientData => serializer.serialize_str("insufficient_data"),
        }
    }
}
