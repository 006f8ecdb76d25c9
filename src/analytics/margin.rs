//! Profit margins per `(category, sub_category)` and the top-N ranking over them.

use std::collections::HashMap;

use itertools::process_results;
use serde::Serialize;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::processing::{fold_by_key, top_n_by, Sum};
use crate::types::{Metric, Order};

use super::keys::CategorySubCategory;

/// `sum(profit) / sum(sales)` per `(category, sub_category)`.
///
/// Both sums are folded in the same pass. A group whose sales total zero maps to
/// [`Metric::Undefined`].
pub fn profit_margin_by_category_subcategory<I>(
    orders: I,
) -> AnalyticsResult<HashMap<CategorySubCategory, Metric>>
where
    I: IntoIterator<Item = AnalyticsResult<Order>>,
{
    process_results(orders, |orders| {
        fold_by_key::<_, _, _, (Sum, Sum), _, _, _>(orders, CategorySubCategory::of, |o| {
            (o.profit, o.sales)
        })
        .into_iter()
        .map(|(key, (profit, sales))| (key, Metric::ratio(profit.total(), sales.total())))
        .collect()
    })
}

/// One entry of [`top_categories_by_margin`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMargin {
    /// 1-based position.
    pub rank: usize,
    pub key: CategorySubCategory,
    pub margin: f64,
}

/// The `n` `(category, sub_category)` groups with the highest margin, highest first.
///
/// Groups with an undefined margin are not ranked. Equal margins are ordered by ascending
/// `(category, sub_category)`. `n == 0` is rejected before any row is read.
pub fn top_categories_by_margin<I>(orders: I, n: usize) -> AnalyticsResult<Vec<RankedMargin>>
where
    I: IntoIterator<Item = AnalyticsResult<Order>>,
{
    ensure_top_n(n)?;
    let margins = profit_margin_by_category_subcategory(orders)?;
    rank_margins(margins, n)
}

pub(crate) fn ensure_top_n(n: usize) -> AnalyticsResult<()> {
    if n == 0 {
        return Err(AnalyticsError::policy("top-N by margin requires n >= 1"));
    }
    Ok(())
}

pub(crate) fn rank_margins(
    margins: HashMap<CategorySubCategory, Metric>,
    n: usize,
) -> AnalyticsResult<Vec<RankedMargin>> {
    Ok(top_n_by(margins, n, |m| m.value())?
        .into_iter()
        .enumerate()
        .map(|(i, (key, margin))| RankedMargin {
            rank: i + 1,
            key,
            margin,
        })
        .collect())
}
