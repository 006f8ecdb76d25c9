//! Lazy CSV order stream.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{AnalyticsError, AnalyticsResult, ParseError};
use crate::types::Order;

use super::observability::{notify_failure, StreamContext, StreamReport, StreamTracker};
use super::row::{parse_row, ColumnIndex, CsvRow};
use super::unified::StreamOptions;

/// A forward-only, single-pass iterator of orders read from CSV.
///
/// Rows are read and parsed one at a time; nothing is buffered beyond the CSV reader's own
/// buffer. The stream owns its reader: for a path-opened stream the file is closed when the stream
/// is exhausted or dropped, including when a caller stops iterating early.
///
/// Items are `Err` only for fatal conditions (read failures, or a bad row under
/// [`super::ParseErrorPolicy::FailFast`]); after yielding an error the stream is finished.
pub struct OrderStream<R> {
    records: csv::StringRecordsIntoIter<R>,
    index: ColumnIndex,
    tracker: StreamTracker,
    rows_seen: usize,
}

impl<R> fmt::Debug for OrderStream<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderStream")
            .field("rows_seen", &self.rows_seen)
            .field("report", self.tracker.report())
            .finish_non_exhaustive()
    }
}

impl OrderStream<File> {
    /// Open `path` and stream its orders.
    pub fn from_path(path: impl AsRef<Path>, options: &StreamOptions) -> AnalyticsResult<Self> {
        let path = path.as_ref();
        let ctx = StreamContext::for_path(path);
        match File::open(path) {
            Ok(file) => Self::with_context(file, options, ctx),
            Err(e) => {
                let err = AnalyticsError::Io(e);
                notify_failure(options, &ctx, &err);
                Err(err)
            }
        }
    }
}

impl<R: Read> OrderStream<R> {
    /// Stream orders from an already-open reader.
    ///
    /// Pass `&mut reader` to keep ownership: the stream then only borrows the reader and the
    /// caller decides when to close it.
    pub fn from_reader(reader: R, options: &StreamOptions) -> AnalyticsResult<Self> {
        Self::with_context(reader, options, StreamContext::detached())
    }

    pub(crate) fn with_context(
        reader: R,
        options: &StreamOptions,
        ctx: StreamContext,
    ) -> AnalyticsResult<Self> {
        options.validate()?;
        Self::open_records(reader, options)
            .map(|(records, index)| Self {
                records,
                index,
                tracker: StreamTracker::new(ctx.clone(), options),
                rows_seen: 0,
            })
            .inspect_err(|err| notify_failure(options, &ctx, err))
    }

    fn open_records(
        reader: R,
        options: &StreamOptions,
    ) -> AnalyticsResult<(csv::StringRecordsIntoIter<R>, ColumnIndex)> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(options.delimiter)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        let index = ColumnIndex::resolve(&headers, &options.aliases)?;
        Ok((rdr.into_records(), index))
    }

    pub(crate) fn defer_finish(&mut self) {
        self.tracker.defer_finish();
    }

    /// Counters and skipped-row log so far.
    pub fn report(&self) -> &StreamReport {
        self.tracker.report()
    }

    /// Consume the stream, returning its report.
    pub fn into_report(self) -> StreamReport {
        self.tracker.into_report()
    }
}

impl<R: Read> Iterator for OrderStream<R> {
    type Item = AnalyticsResult<Order>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.tracker.is_closed() {
            let Some(result) = self.records.next() else {
                self.tracker.finish();
                return None;
            };
            self.rows_seen += 1;
            // Report 1-based row number for users; +1 again because header is row 1.
            let user_row = self.rows_seen + 1;

            let parsed = match result {
                Ok(record) => {
                    let row = CsvRow {
                        record: &record,
                        index: &self.index,
                    };
                    parse_row(&row, user_row, &self.tracker.options().date_format)
                }
                Err(err) => match row_level_error(&err, user_row) {
                    Some(parse_err) => Err(parse_err),
                    None => return Some(Err(self.tracker.fail(AnalyticsError::Csv(err)))),
                },
            };

            if let Some(item) = self.tracker.admit(user_row, parsed) {
                return Some(item);
            }
        }
        None
    }
}

/// CSV errors confined to one record are treated like parse errors so the skip policy applies.
fn row_level_error(err: &csv::Error, row: usize) -> Option<ParseError> {
    match err.kind() {
        csv::ErrorKind::Utf8 { err: utf8, .. } => Some(ParseError::new(
            row,
            "<record>",
            "",
            format!("invalid UTF-8 in field {}", utf8.field()),
        )),
        csv::ErrorKind::UnequalLengths { expected_len, len, .. } => Some(ParseError::new(
            row,
            "<record>",
            "",
            format!("expected {expected_len} fields, found {len}"),
        )),
        _ => None,
    }
}
