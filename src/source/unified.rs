//! Unified streaming entrypoint and options.
//!
//! Most callers should use [`stream_orders`], which opens an [`OrderSource`] (a file, a glob of
//! files, or a directory) and yields parsed [`crate::types::Order`]s lazily.
//!
//! - Already-open readers go through [`stream_orders_from_reader`].
//! - In-memory tables of `HashMap<String, String>` rows go through [`stream_rows`].
//! - If an [`super::observability::StreamObserver`] is provided, skipped rows, data warnings,
//!   completion and failures are reported to it.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::Order;

use super::csv::OrderStream;
use super::files::FileOrderStream;
use super::observability::{StreamContext, StreamObserver, StreamReport, StreamSeverity, StreamTracker};
use super::row::{parse_row, ColumnAliases, MapRow};

/// Date format used when none is configured (`MM/DD/YYYY`).
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";

/// What to do with a row that fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseErrorPolicy {
    /// Drop the row, log it, count it in the [`StreamReport`], keep streaming (default).
    #[default]
    SkipWithLog,
    /// Yield the first parse error and end the stream.
    FailFast,
}

/// Options controlling how rows are read and validated.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct StreamOptions {
    /// Parse-error handling.
    pub policy: ParseErrorPolicy,
    /// chrono format string for `Order Date` / `Ship Date`.
    pub date_format: String,
    /// CSV field delimiter.
    pub delimiter: u8,
    /// Extra header names per column.
    pub aliases: ColumnAliases,
    /// Upper bound on skipped-row errors kept in the [`StreamReport`]. The skip counter is
    /// always exact.
    pub max_logged_errors: usize,
    /// Optional observer for skip logs, warnings and alerts.
    pub observer: Option<Arc<dyn StreamObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: StreamSeverity,
}

impl fmt::Debug for StreamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOptions")
            .field("policy", &self.policy)
            .field("date_format", &self.date_format)
            .field("delimiter", &(self.delimiter as char))
            .field("aliases", &self.aliases)
            .field("max_logged_errors", &self.max_logged_errors)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            policy: ParseErrorPolicy::default(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            delimiter: b',',
            aliases: ColumnAliases::default(),
            max_logged_errors: 100,
            observer: None,
            alert_at_or_above: StreamSeverity::Critical,
        }
    }
}

impl StreamOptions {
    /// Reject configurations no row could ever be read with.
    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.date_format.trim().is_empty() {
            return Err(AnalyticsError::policy("date_format must not be empty"));
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(AnalyticsError::policy(format!(
                "date_format '{}' is not a valid chrono format",
                self.date_format
            )));
        }
        if !self.delimiter.is_ascii() || matches!(self.delimiter, b'"' | b'\n' | b'\r') {
            return Err(AnalyticsError::policy(format!(
                "delimiter {:?} cannot separate CSV fields",
                self.delimiter as char
            )));
        }
        Ok(())
    }
}

/// Where orders are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSource {
    /// A single CSV file.
    Path(PathBuf),
    /// Every file matching a glob pattern (e.g. `data/orders-*.csv`), in sorted path order.
    Glob(String),
    /// Every `.csv` file below a directory (recursively), in sorted path order.
    Directory(PathBuf),
}

impl From<PathBuf> for OrderSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for OrderSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for OrderSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

/// Stream orders from an [`OrderSource`].
///
/// The first file is opened before this returns, so a missing or unreadable source (or a header
/// without the required columns) surfaces here as an error. Later files of a multi-file source
/// are opened lazily, one at a time, and closed as soon as they are exhausted.
///
/// Every call produces an independent pass; streams are not restartable.
///
/// # Examples
///
/// ```no_run
/// use order_analytics::source::{stream_orders, OrderSource, StreamOptions};
///
/// # fn main() -> Result<(), order_analytics::AnalyticsError> {
/// let source = OrderSource::from("data/orders.csv");
/// let mut stream = stream_orders(&source, &StreamOptions::default())?;
/// let mut total_sales = 0.0;
/// for order in stream.by_ref() {
///     total_sales += order?.sales;
/// }
/// println!("sales={total_sales} skipped={}", stream.report().rows_skipped);
/// # Ok(())
/// # }
/// ```
pub fn stream_orders(source: &OrderSource, options: &StreamOptions) -> AnalyticsResult<FileOrderStream> {
    options.validate()?;
    let paths = source.resolve()?;
    FileOrderStream::open(StreamContext::for_source(source), paths, options)
}

/// Stream orders from an already-open reader.
///
/// The reader's lifetime stays with the caller when `&mut R` is passed.
pub fn stream_orders_from_reader<R: Read>(reader: R, options: &StreamOptions) -> AnalyticsResult<OrderStream<R>> {
    OrderStream::from_reader(reader, options)
}

/// Stream orders from in-memory rows keyed by header name.
///
/// Header names are matched the same way as CSV headers (see [`ColumnAliases`]); a row missing a
/// required column is a parse error for that row.
pub fn stream_rows<I>(rows: I, options: &StreamOptions) -> AnalyticsResult<RowStream<I::IntoIter>>
where
    I: IntoIterator,
    I::Item: Borrow<HashMap<String, String>>,
{
    options.validate()?;
    Ok(RowStream {
        rows: rows.into_iter(),
        tracker: StreamTracker::new(StreamContext::detached(), options),
        rows_seen: 0,
    })
}

/// Lazy order stream over in-memory rows. See [`stream_rows`].
pub struct RowStream<I> {
    rows: I,
    tracker: StreamTracker,
    rows_seen: usize,
}

impl<I> fmt::Debug for RowStream<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowStream")
            .field("rows_seen", &self.rows_seen)
            .field("report", self.tracker.report())
            .finish_non_exhaustive()
    }
}

impl<I> RowStream<I> {
    /// Counters and skipped-row log so far.
    pub fn report(&self) -> &StreamReport {
        self.tracker.report()
    }
}

impl<I> Iterator for RowStream<I>
where
    I: Iterator,
    I::Item: Borrow<HashMap<String, String>>,
{
    type Item = AnalyticsResult<Order>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.tracker.is_closed() {
            let Some(row) = self.rows.next() else {
                self.tracker.finish();
                return None;
            };
            self.rows_seen += 1;
            let row: &HashMap<String, String> = row.borrow();
            let options = self.tracker.options();
            let parsed = parse_row(
                &MapRow::new(row, &options.aliases),
                self.rows_seen,
                &options.date_format,
            );
            if let Some(item) = self.tracker.admit(self.rows_seen, parsed) {
                return Some(item);
            }
        }
        None
    }
}
