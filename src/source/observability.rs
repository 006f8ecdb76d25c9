use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{AnalyticsError, AnalyticsResult, ParseError};
use crate::types::Order;

use super::unified::{OrderSource, ParseErrorPolicy, StreamOptions};

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum StreamSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (row skipped, suspicious data).
    Warning,
    /// Error-level event (stream aborted).
    Error,
    /// Critical error (the source could not be opened or read).
    Critical,
}

/// Where a stream's rows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamContext {
    /// File path, or `None` for caller-supplied readers and in-memory rows.
    pub path: Option<PathBuf>,
}

impl StreamContext {
    pub(crate) fn for_path(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
        }
    }

    pub(crate) fn detached() -> Self {
        Self { path: None }
    }

    /// The whole source: its file, glob pattern or directory.
    pub(crate) fn for_source(source: &OrderSource) -> Self {
        let path = match source {
            OrderSource::Path(path) | OrderSource::Directory(path) => path.clone(),
            OrderSource::Glob(pattern) => PathBuf::from(pattern),
        };
        Self { path: Some(path) }
    }

    /// Short label for logs.
    pub fn label(&self) -> String {
        match &self.path {
            Some(p) => p.display().to_string(),
            None => "<reader>".to_string(),
        }
    }
}

/// Suspicious but parseable data, surfaced without dropping the row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DataWarning {
    /// Sales below zero.
    NegativeSales { row: usize, sales: f64 },
    /// Ship date earlier than order date.
    ShippedBeforeOrdered {
        row: usize,
        order_date: NaiveDate,
        ship_date: NaiveDate,
    },
}

/// Per-stream bookkeeping reported back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamReport {
    /// Data rows pulled from the source (header excluded).
    pub rows_read: u64,
    /// Rows that became orders.
    pub orders_emitted: u64,
    /// Rows dropped under [`ParseErrorPolicy::SkipWithLog`].
    pub rows_skipped: u64,
    /// Data-quality warnings raised on emitted orders.
    pub warnings: u64,
    /// The first skipped rows' errors, capped by [`StreamOptions::max_logged_errors`].
    pub skipped: Vec<ParseError>,
}

impl StreamReport {
    /// Fold another report (e.g. from the next file of a multi-file source) into this one.
    pub fn merge(&mut self, other: &StreamReport, max_logged_errors: usize) {
        self.rows_read += other.rows_read;
        self.orders_emitted += other.orders_emitted;
        self.rows_skipped += other.rows_skipped;
        self.warnings += other.warnings;
        let room = max_logged_errors.saturating_sub(self.skipped.len());
        self.skipped
            .extend(other.skipped.iter().take(room).cloned());
    }
}

/// Observer interface for stream events.
///
/// Implementors can record metrics, write audit logs, or trigger alerts. All callbacks default to
/// no-ops. The stream also logs every event through `tracing`, so an observer is only needed for
/// programmatic hooks.
pub trait StreamObserver: Send + Sync {
    /// A row was dropped under [`ParseErrorPolicy::SkipWithLog`].
    fn on_row_skipped(&self, _ctx: &StreamContext, _error: &ParseError) {}

    /// An emitted order looks suspicious.
    fn on_data_warning(&self, _ctx: &StreamContext, _warning: &DataWarning) {}

    /// The stream reached the end of its source.
    fn on_finished(&self, _ctx: &StreamContext, _report: &StreamReport) {}

    /// The stream failed (could not open, bad header, fail-fast parse error, read error).
    fn on_failure(&self, _ctx: &StreamContext, _severity: StreamSeverity, _error: &AnalyticsError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &StreamContext, severity: StreamSeverity, error: &AnalyticsError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn StreamObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn StreamObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl StreamObserver for CompositeObserver {
    fn on_row_skipped(&self, ctx: &StreamContext, error: &ParseError) {
        for o in &self.observers {
            o.on_row_skipped(ctx, error);
        }
    }

    fn on_data_warning(&self, ctx: &StreamContext, warning: &DataWarning) {
        for o in &self.observers {
            o.on_data_warning(ctx, warning);
        }
    }

    fn on_finished(&self, ctx: &StreamContext, report: &StreamReport) {
        for o in &self.observers {
            o.on_finished(ctx, report);
        }
    }

    fn on_failure(&self, ctx: &StreamContext, severity: StreamSeverity, error: &AnalyticsError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &StreamContext, severity: StreamSeverity, error: &AnalyticsError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Appends stream events to a local log file, one line per event.
///
/// Useful as a persistent skip log: every dropped row is written with its row number, column and
/// raw value.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl StreamObserver for FileObserver {
    fn on_row_skipped(&self, ctx: &StreamContext, error: &ParseError) {
        self.append_line(&format!("{} skip source={} err={}", unix_ts(), ctx.label(), error));
    }

    fn on_data_warning(&self, ctx: &StreamContext, warning: &DataWarning) {
        self.append_line(&format!("{} warn source={} {:?}", unix_ts(), ctx.label(), warning));
    }

    fn on_finished(&self, ctx: &StreamContext, report: &StreamReport) {
        self.append_line(&format!(
            "{} ok source={} rows={} orders={} skipped={}",
            unix_ts(),
            ctx.label(),
            report.rows_read,
            report.orders_emitted,
            report.rows_skipped
        ));
    }

    fn on_failure(&self, ctx: &StreamContext, severity: StreamSeverity, error: &AnalyticsError) {
        self.append_line(&format!(
            "{} fail severity={:?} source={} err={}",
            unix_ts(),
            severity,
            ctx.label(),
            error
        ));
    }

    fn on_alert(&self, ctx: &StreamContext, severity: StreamSeverity, error: &AnalyticsError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} source={} err={}",
            unix_ts(),
            severity,
            ctx.label(),
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub(crate) fn severity_for_error(e: &AnalyticsError) -> StreamSeverity {
    if e.is_resource_error() {
        StreamSeverity::Critical
    } else {
        StreamSeverity::Error
    }
}

/// Log a stream failure and report it to the configured observer.
pub(crate) fn notify_failure(options: &StreamOptions, ctx: &StreamContext, error: &AnalyticsError) {
    let severity = severity_for_error(error);
    tracing::error!(source = %ctx.label(), ?severity, %error, "order stream failed");
    if let Some(obs) = options.observer.as_ref() {
        obs.on_failure(ctx, severity, error);
        if severity >= options.alert_at_or_above {
            obs.on_alert(ctx, severity, error);
        }
    }
}

/// Log a completed stream and report it to the configured observer.
pub(crate) fn notify_finished(options: &StreamOptions, ctx: &StreamContext, report: &StreamReport) {
    tracing::debug!(
        source = %ctx.label(),
        rows = report.rows_read,
        orders = report.orders_emitted,
        skipped = report.rows_skipped,
        "order stream finished"
    );
    if let Some(obs) = options.observer.as_ref() {
        obs.on_finished(ctx, report);
    }
}

/// Shared row accounting for every stream flavor: applies the parse-error policy, keeps the
/// [`StreamReport`] and drives logging/observer callbacks.
pub(crate) struct StreamTracker {
    ctx: StreamContext,
    options: StreamOptions,
    report: StreamReport,
    closed: bool,
    notify_finish: bool,
}

impl StreamTracker {
    pub(crate) fn new(ctx: StreamContext, options: &StreamOptions) -> Self {
        Self {
            ctx,
            options: options.clone(),
            report: StreamReport::default(),
            closed: false,
            notify_finish: true,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn report(&self) -> &StreamReport {
        &self.report
    }

    pub(crate) fn into_report(self) -> StreamReport {
        self.report
    }

    pub(crate) fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// Account for one parsed (or unparseable) row.
    ///
    /// Returns `None` when the row was skipped and the caller should pull the next one.
    pub(crate) fn admit(
        &mut self,
        row: usize,
        parsed: Result<Order, ParseError>,
    ) -> Option<AnalyticsResult<Order>> {
        self.report.rows_read += 1;
        match parsed.map_err(|e| e.in_file(self.ctx.path.clone())) {
            Ok(order) => {
                self.report.orders_emitted += 1;
                self.inspect(row, &order);
                Some(Ok(order))
            }
            Err(error) => match self.options.policy {
                ParseErrorPolicy::SkipWithLog => {
                    self.skip(error);
                    None
                }
                ParseErrorPolicy::FailFast => Some(Err(self.fail(AnalyticsError::Parse(error)))),
            },
        }
    }

    /// Close the stream with a fatal error, returning it for the caller to yield.
    pub(crate) fn fail(&mut self, error: AnalyticsError) -> AnalyticsError {
        self.closed = true;
        notify_failure(&self.options, &self.ctx, &error);
        error
    }

    /// Leave completion to an enclosing multi-file stream.
    pub(crate) fn defer_finish(&mut self) {
        self.notify_finish = false;
    }

    /// Close the stream after the source ran dry. Idempotent.
    pub(crate) fn finish(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.notify_finish {
            notify_finished(&self.options, &self.ctx, &self.report);
        }
    }

    fn skip(&mut self, error: ParseError) {
        tracing::warn!(source = %self.ctx.label(), %error, "skipping unparseable row");
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_row_skipped(&self.ctx, &error);
        }
        self.report.rows_skipped += 1;
        if self.report.skipped.len() < self.options.max_logged_errors {
            self.report.skipped.push(error);
        }
    }

    fn inspect(&mut self, row: usize, order: &Order) {
        if order.sales < 0.0 {
            self.warn(DataWarning::NegativeSales {
                row,
                sales: order.sales,
            });
        }
        if let Some(ship_date) = order.ship_date {
            if ship_date < order.order_date {
                self.warn(DataWarning::ShippedBeforeOrdered {
                    row,
                    order_date: order.order_date,
                    ship_date,
                });
            }
        }
    }

    fn warn(&mut self, warning: DataWarning) {
        self.report.warnings += 1;
        tracing::warn!(source = %self.ctx.label(), ?warning, "suspicious order data");
        if let Some(obs) = self.options.observer.as_ref() {
            obs.on_data_warning(&self.ctx, &warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StreamReport;
    use crate::error::ParseError;

    fn report_with_skips(n: usize) -> StreamReport {
        StreamReport {
            rows_read: 10,
            orders_emitted: 10 - n as u64,
            rows_skipped: n as u64,
            warnings: 1,
            skipped: (0..n)
                .map(|i| ParseError::new(i + 2, "Sales", "x", "bad"))
                .collect(),
        }
    }

    #[test]
    fn merge_sums_counters_and_caps_logged_errors() {
        let mut total = report_with_skips(2);
        total.merge(&report_with_skips(3), 4);

        assert_eq!(total.rows_read, 20);
        assert_eq!(total.orders_emitted, 15);
        assert_eq!(total.rows_skipped, 5);
        assert_eq!(total.warnings, 2);
        assert_eq!(total.skipped.len(), 4);
    }
}
