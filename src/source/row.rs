//! Row model and the order parser.
//!
//! A row is anything that can answer "what is the raw text for this column?" ([`RowLookup`]).
//! CSV records, in-memory `HashMap` rows and test doubles all go through the same
//! [`parse_row`], so validation rules live in exactly one place.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::error::{AnalyticsError, AnalyticsResult, ParseError};
use crate::types::{Order, OrderDetails};

/// Every column the parser knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OrderColumn {
    OrderDate,
    ShipDate,
    Market,
    Category,
    SubCategory,
    Sales,
    Profit,
    Discount,
    Quantity,
    OrderId,
    CustomerId,
    CustomerName,
    Country,
    State,
    ProductId,
    ProductName,
    ShippingCost,
}

impl OrderColumn {
    /// All columns, required ones first.
    pub const ALL: [OrderColumn; 17] = [
        Self::OrderDate,
        Self::ShipDate,
        Self::Market,
        Self::Category,
        Self::SubCategory,
        Self::Sales,
        Self::Profit,
        Self::Discount,
        Self::Quantity,
        Self::OrderId,
        Self::CustomerId,
        Self::CustomerName,
        Self::Country,
        Self::State,
        Self::ProductId,
        Self::ProductName,
        Self::ShippingCost,
    ];

    /// Name used in error messages.
    pub fn display_name(self) -> &'static str {
        self.default_aliases()[0]
    }

    /// Whether a source must carry this column for any row to parse.
    pub fn is_required(self) -> bool {
        matches!(
            self,
            Self::OrderDate
                | Self::ShipDate
                | Self::Market
                | Self::Category
                | Self::SubCategory
                | Self::Sales
                | Self::Profit
                | Self::Discount
        )
    }

    fn default_aliases(self) -> &'static [&'static str] {
        match self {
            Self::OrderDate => &["Order Date"],
            Self::ShipDate => &["Ship Date"],
            Self::Market => &["Market", "Region"],
            Self::Category => &["Category"],
            Self::SubCategory => &["Sub-Category"],
            Self::Sales => &["Sales"],
            Self::Profit => &["Profit"],
            Self::Discount => &["Discount"],
            Self::Quantity => &["Quantity"],
            Self::OrderId => &["Order ID"],
            Self::CustomerId => &["Customer ID"],
            Self::CustomerName => &["Customer Name"],
            Self::Country => &["Country"],
            Self::State => &["State"],
            Self::ProductId => &["Product ID"],
            Self::ProductName => &["Product Name"],
            Self::ShippingCost => &["Shipping Cost"],
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Normalize a header for comparison: ASCII alphanumerics only, lowercased.
///
/// `Sub-Category`, `Sub.Category` and `sub_category` all normalize to `subcategory`.
pub fn normalize_header(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Header names accepted for each [`OrderColumn`].
///
/// Built-in names (e.g. `Market` or `Region` for [`OrderColumn::Market`]) are always accepted;
/// extra aliases can be registered for sources with unusual headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnAliases {
    extra: HashMap<OrderColumn, Vec<String>>,
}

impl ColumnAliases {
    /// Accept `header` as a name for `column`.
    pub fn with_alias(mut self, column: OrderColumn, header: impl AsRef<str>) -> Self {
        self.extra
            .entry(column)
            .or_default()
            .push(normalize_header(header.as_ref()));
        self
    }

    /// Whether `header` names `column`.
    pub fn matches(&self, column: OrderColumn, header: &str) -> bool {
        let header = normalize_header(header);
        !header.is_empty() && self.candidates(column).any(|name| name == header)
    }

    /// Normalized names for `column`, most preferred first: built-in names, then extras in
    /// registration order.
    fn candidates(&self, column: OrderColumn) -> impl Iterator<Item = String> {
        column
            .default_aliases()
            .iter()
            .map(|alias| normalize_header(alias))
            .chain(self.extra.get(&column).into_iter().flatten().cloned())
    }
}

/// Header position of each known column, resolved once per CSV source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ColumnIndex {
    positions: [Option<usize>; OrderColumn::ALL.len()],
}

impl ColumnIndex {
    /// Map headers to column positions; fails if a required column is absent.
    pub(crate) fn resolve(headers: &StringRecord, aliases: &ColumnAliases) -> AnalyticsResult<Self> {
        // A source may carry both `Market` and `Region`; the earlier alias wins, not the
        // earlier header.
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let mut positions = [None; OrderColumn::ALL.len()];
        for column in OrderColumn::ALL {
            positions[column.slot()] = aliases
                .candidates(column)
                .find_map(|name| normalized.iter().position(|h| *h == name));
        }

        let missing: Vec<&str> = OrderColumn::ALL
            .iter()
            .filter(|c| c.is_required() && positions[c.slot()].is_none())
            .map(|c| c.display_name())
            .collect();
        if !missing.is_empty() {
            return Err(AnalyticsError::SchemaMismatch {
                message: format!(
                    "missing required column(s) {missing:?}. headers={:?}",
                    headers.iter().collect::<Vec<_>>()
                ),
            });
        }

        Ok(Self { positions })
    }

    fn position(&self, column: OrderColumn) -> Option<usize> {
        self.positions[column.slot()]
    }
}

/// Raw access to one row's cells by column.
pub trait RowLookup {
    /// Raw text for `column`, or `None` if the row has no such column.
    fn value(&self, column: OrderColumn) -> Option<&str>;
}

/// Looks columns up by header name using the built-in aliases.
impl RowLookup for HashMap<String, String> {
    fn value(&self, column: OrderColumn) -> Option<&str> {
        find_in_map(self, &ColumnAliases::default(), column)
    }
}

fn find_in_map<'a>(
    row: &'a HashMap<String, String>,
    aliases: &ColumnAliases,
    column: OrderColumn,
) -> Option<&'a str> {
    aliases.candidates(column).find_map(|wanted| {
        row.iter()
            .find(|(name, _)| normalize_header(name) == wanted)
            .map(|(_, v)| v.as_str())
    })
}

/// A `HashMap` row paired with configured aliases.
pub(crate) struct MapRow<'a> {
    row: &'a HashMap<String, String>,
    aliases: &'a ColumnAliases,
}

impl<'a> MapRow<'a> {
    pub(crate) fn new(row: &'a HashMap<String, String>, aliases: &'a ColumnAliases) -> Self {
        Self { row, aliases }
    }
}

impl RowLookup for MapRow<'_> {
    fn value(&self, column: OrderColumn) -> Option<&str> {
        find_in_map(self.row, self.aliases, column)
    }
}

/// A CSV record viewed through a resolved [`ColumnIndex`].
pub(crate) struct CsvRow<'a> {
    pub(crate) record: &'a StringRecord,
    pub(crate) index: &'a ColumnIndex,
}

impl RowLookup for CsvRow<'_> {
    fn value(&self, column: OrderColumn) -> Option<&str> {
        self.index.position(column).and_then(|i| self.record.get(i))
    }
}

/// Parse and validate one row into an [`Order`].
///
/// Rules:
///
/// - Required columns must be present; required text and numbers must be non-empty.
/// - `Order Date` must match `date_format`; an empty `Ship Date` means "not shipped", a non-empty
///   one must match `date_format`.
/// - `Sales`, `Profit` and the optional `Shipping Cost` must be finite numbers.
/// - `Discount` must be a number in `[0, 1]`.
/// - `Quantity` is optional; when present and non-empty it must be a non-negative integer.
///
/// There is no fallback: a cell that fails its rule is a [`ParseError`] naming the column and the
/// raw value.
pub fn parse_row<R: RowLookup + ?Sized>(
    row: &R,
    row_number: usize,
    date_format: &str,
) -> Result<Order, ParseError> {
    let cells = Cells { row, row_number };

    let order_date = cells.required_date(OrderColumn::OrderDate, date_format)?;
    let ship_date = cells.optional_date(OrderColumn::ShipDate, date_format)?;
    let market = cells.required_text(OrderColumn::Market)?;
    let category = cells.required_text(OrderColumn::Category)?;
    let sub_category = cells.required_text(OrderColumn::SubCategory)?;
    let sales = cells.required_number(OrderColumn::Sales)?;
    let profit = cells.required_number(OrderColumn::Profit)?;
    let discount = cells.required_number(OrderColumn::Discount)?;
    if !(0.0..=1.0).contains(&discount) {
        return Err(cells.error(
            OrderColumn::Discount,
            cells.raw(OrderColumn::Discount)?,
            "discount must be within [0, 1]",
        ));
    }
    let quantity = cells.optional_parsed::<u32>(OrderColumn::Quantity)?;

    let details = OrderDetails {
        order_id: cells.optional_text(OrderColumn::OrderId),
        customer_id: cells.optional_text(OrderColumn::CustomerId),
        customer_name: cells.optional_text(OrderColumn::CustomerName),
        country: cells.optional_text(OrderColumn::Country),
        state: cells.optional_text(OrderColumn::State),
        product_id: cells.optional_text(OrderColumn::ProductId),
        product_name: cells.optional_text(OrderColumn::ProductName),
        shipping_cost: cells.optional_number(OrderColumn::ShippingCost)?,
    };

    Ok(Order {
        order_date,
        ship_date,
        market,
        category,
        sub_category,
        sales,
        profit,
        discount,
        quantity,
        details,
    })
}

struct Cells<'r, R: ?Sized> {
    row: &'r R,
    row_number: usize,
}

impl<R: RowLookup + ?Sized> Cells<'_, R> {
    fn error(&self, column: OrderColumn, raw: &str, message: impl Into<String>) -> ParseError {
        ParseError::new(self.row_number, column.display_name(), raw, message)
    }

    /// Raw cell of a column that must exist.
    fn raw(&self, column: OrderColumn) -> Result<&str, ParseError> {
        self.row
            .value(column)
            .ok_or_else(|| self.error(column, "", "missing required column"))
    }

    /// Trimmed cell of a column that must exist and be non-empty.
    fn non_empty(&self, column: OrderColumn) -> Result<&str, ParseError> {
        let raw = self.raw(column)?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(self.error(column, raw, "missing value"));
        }
        Ok(trimmed)
    }

    /// Trimmed cell, `None` when the column is absent or the cell is blank.
    fn present(&self, column: OrderColumn) -> Option<&str> {
        self.row
            .value(column)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn required_text(&self, column: OrderColumn) -> Result<String, ParseError> {
        self.non_empty(column).map(str::to_owned)
    }

    fn optional_text(&self, column: OrderColumn) -> Option<String> {
        self.present(column).map(str::to_owned)
    }

    fn required_number(&self, column: OrderColumn) -> Result<f64, ParseError> {
        let raw = self.non_empty(column)?;
        self.finite(column, raw)
    }

    fn optional_number(&self, column: OrderColumn) -> Result<Option<f64>, ParseError> {
        self.present(column)
            .map(|raw| self.finite(column, raw))
            .transpose()
    }

    fn finite(&self, column: OrderColumn, raw: &str) -> Result<f64, ParseError> {
        let value = raw
            .parse::<f64>()
            .map_err(|e| self.error(column, raw, e.to_string()))?;
        if !value.is_finite() {
            return Err(self.error(column, raw, "expected a finite number"));
        }
        Ok(value)
    }

    fn optional_parsed<T>(&self, column: OrderColumn) -> Result<Option<T>, ParseError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.present(column)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| self.error(column, raw, e.to_string()))
            })
            .transpose()
    }

    fn required_date(&self, column: OrderColumn, format: &str) -> Result<NaiveDate, ParseError> {
        let raw = self.non_empty(column)?;
        self.date(column, raw, format)
    }

    fn optional_date(
        &self,
        column: OrderColumn,
        format: &str,
    ) -> Result<Option<NaiveDate>, ParseError> {
        // Presence is required even though the cell may be blank.
        self.raw(column)?;
        self.present(column)
            .map(|raw| self.date(column, raw, format))
            .transpose()
    }

    fn date(&self, column: OrderColumn, raw: &str, format: &str) -> Result<NaiveDate, ParseError> {
        NaiveDate::parse_from_str(raw, format).map_err(|e| {
            self.error(column, raw, format!("expected date in format '{format}': {e}"))
        })
    }
}
