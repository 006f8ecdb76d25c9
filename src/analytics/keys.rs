//! Composite grouping keys.
//!
//! Each key is a named struct rather than a tuple so that results serialize with field names.
//! Derived `Ord` compares fields in declaration order.

use std::fmt;

use serde::Serialize;

use crate::types::Order;

/// `(year, market, category)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct YearMarketCategory {
    pub year: i32,
    pub market: String,
    pub category: String,
}

impl YearMarketCategory {
    /// Build a key from its parts.
    pub fn new(year: i32, market: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            year,
            market: market.into(),
            category: category.into(),
        }
    }

    /// The key `order` groups under.
    pub fn of(order: &Order) -> Self {
        Self::new(order.year(), &order.market, &order.category)
    }
}

impl fmt::Display for YearMarketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.year, self.market, self.category)
    }
}

/// `(market, category)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MarketCategory {
    pub market: String,
    pub category: String,
}

impl MarketCategory {
    /// Build a key from its parts.
    pub fn new(market: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            market: market.into(),
            category: category.into(),
        }
    }

    /// The key `order` groups under.
    pub fn of(order: &Order) -> Self {
        Self::new(&order.market, &order.category)
    }
}

impl fmt::Display for MarketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.market, self.category)
    }
}

/// `(category, sub_category)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CategorySubCategory {
    pub category: String,
    pub sub_category: String,
}

impl CategorySubCategory {
    /// Build a key from its parts.
    pub fn new(category: impl Into<String>, sub_category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            sub_category: sub_category.into(),
        }
    }

    /// The key `order` groups under.
    pub fn of(order: &Order) -> Self {
        Self::new(&order.category, &order.sub_category)
    }
}

impl fmt::Display for CategorySubCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.category, self.sub_category)
    }
}

#[cfg(test)]
mod tests {
    use super::{CategorySubCategory, MarketCategory, YearMarketCategory};

    #[test]
    fn keys_order_field_by_field() {
        let mut keys = vec![
            YearMarketCategory::new(2023, "EU", "Furniture"),
            YearMarketCategory::new(2022, "US", "Technology"),
            YearMarketCategory::new(2022, "US", "Furniture"),
        ];
        keys.sort();
        assert_eq!(keys[0], YearMarketCategory::new(2022, "US", "Furniture"));
        assert_eq!(keys[2].year, 2023);
    }

    #[test]
    fn same_fields_in_different_key_types_stay_distinct() {
        let mc = MarketCategory::new("Furniture", "Chairs");
        let cs = CategorySubCategory::new("Furniture", "Chairs");
        assert_eq!(
            serde_json::to_value(&mc).unwrap(),
            serde_json::json!({"market": "Furniture", "category": "Chairs"})
        );
        assert_eq!(cs.to_string(), "Furniture / Chairs");
    }
}
