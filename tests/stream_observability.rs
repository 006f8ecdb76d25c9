use std::fs;
use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use order_analytics::source::{
    stream_orders, stream_orders_from_reader, CompositeObserver, DataWarning, FileObserver, OrderSource,
    StreamContext, StreamObserver, StreamOptions, StreamReport, StreamSeverity,
};
use order_analytics::{AnalyticsError, ParseError};

#[derive(Default)]
struct RecordingObserver {
    skipped: Mutex<Vec<usize>>,
    warnings: Mutex<Vec<DataWarning>>,
    finished: Mutex<Vec<StreamReport>>,
    failures: Mutex<Vec<StreamSeverity>>,
    alerts: Mutex<Vec<StreamSeverity>>,
}

impl StreamObserver for RecordingObserver {
    fn on_row_skipped(&self, _ctx: &StreamContext, error: &ParseError) {
        self.skipped.lock().unwrap().push(error.row);
    }

    fn on_data_warning(&self, _ctx: &StreamContext, warning: &DataWarning) {
        self.warnings.lock().unwrap().push(warning.clone());
    }

    fn on_finished(&self, _ctx: &StreamContext, report: &StreamReport) {
        self.finished.lock().unwrap().push(report.clone());
    }

    fn on_failure(&self, _ctx: &StreamContext, severity: StreamSeverity, _error: &AnalyticsError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &StreamContext, severity: StreamSeverity, _error: &AnalyticsError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn options_with(obs: &Arc<RecordingObserver>) -> StreamOptions {
    StreamOptions {
        observer: Some(obs.clone()),
        ..Default::default()
    }
}

#[test]
fn observer_receives_failure_and_alert_on_missing_file() {
    let obs = Arc::new(RecordingObserver::default());
    let source = OrderSource::from("tests/fixtures/does_not_exist.csv");
    let _ = stream_orders(&source, &options_with(&obs)).unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![StreamSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![StreamSeverity::Critical]);
}

#[test]
fn schema_mismatch_is_an_error_below_the_default_alert_threshold() {
    let obs = Arc::new(RecordingObserver::default());
    let csv = "Order Date,Market\n01/01/2023,US\n";
    let _ = stream_orders_from_reader(Cursor::new(csv), &options_with(&obs)).unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![StreamSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn alert_threshold_is_configurable() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = StreamOptions {
        alert_at_or_above: StreamSeverity::Error,
        ..options_with(&obs)
    };
    let _ = stream_orders_from_reader(Cursor::new("Sales\n1\n"), &opts).unwrap_err();

    assert_eq!(*obs.alerts.lock().unwrap(), vec![StreamSeverity::Error]);
}

#[test]
fn skipped_rows_and_completion_are_reported() {
    let obs = Arc::new(RecordingObserver::default());
    let source = OrderSource::from("tests/fixtures/orders_bad_date.csv");
    let orders = stream_orders(&source, &options_with(&obs)).unwrap().count();

    assert_eq!(orders, 9);
    assert_eq!(*obs.skipped.lock().unwrap(), vec![6]);
    let finished = obs.finished.lock().unwrap();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].rows_skipped, 1);
    assert_eq!(finished[0].orders_emitted, 9);
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn ship_before_order_raises_a_data_warning() {
    let obs = Arc::new(RecordingObserver::default());
    let source = OrderSource::from("tests/fixtures/orders.csv");
    let _ = stream_orders(&source, &options_with(&obs)).unwrap().count();

    let warnings = obs.warnings.lock().unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0], DataWarning::ShippedBeforeOrdered { row: 6, .. }));
}

#[test]
fn early_drop_does_not_report_completion() {
    let obs = Arc::new(RecordingObserver::default());
    let source = OrderSource::from("tests/fixtures/orders.csv");
    let first = stream_orders(&source, &options_with(&obs)).unwrap().next();

    assert!(matches!(first, Some(Ok(_))));
    assert!(obs.finished.lock().unwrap().is_empty());
}

/// Reader that records when it is dropped.
struct TrackedReader {
    inner: Cursor<&'static str>,
    closed: Arc<AtomicBool>,
}

impl Read for TrackedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Drop for TrackedReader {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[test]
fn dropping_a_stream_early_releases_its_reader() {
    let closed = Arc::new(AtomicBool::new(false));
    let reader = TrackedReader {
        inner: Cursor::new(
            "Order Date,Ship Date,Market,Category,Sub-Category,Sales,Profit,Discount\n\
             01/01/2023,01/02/2023,US,Furniture,Chairs,1,1,0\n\
             01/02/2023,01/03/2023,US,Furniture,Chairs,1,1,0\n",
        ),
        closed: closed.clone(),
    };

    let mut stream = stream_orders_from_reader(reader, &StreamOptions::default()).unwrap();
    assert!(matches!(stream.next(), Some(Ok(_))));
    assert!(!closed.load(Ordering::SeqCst));

    drop(stream);
    assert!(closed.load(Ordering::SeqCst));
}

#[test]
fn multi_file_source_reports_completion_once_with_merged_counts() {
    let dir = tempfile::tempdir().unwrap();
    let header = "Order Date,Ship Date,Market,Category,Sub-Category,Sales,Profit,Discount\n";
    fs::write(
        dir.path().join("a.csv"),
        format!("{header}bad,03/02/2023,US,Technology,Phones,1,1,0\n03/01/2023,03/02/2023,US,Technology,Phones,1,1,0\n"),
    )
    .unwrap();
    fs::write(
        dir.path().join("b.csv"),
        format!("{header}bad,03/02/2023,EU,Technology,Phones,1,1,0\n"),
    )
    .unwrap();

    let obs = Arc::new(RecordingObserver::default());
    let source = OrderSource::Directory(dir.path().to_path_buf());
    let orders = stream_orders(&source, &options_with(&obs)).unwrap().count();

    assert_eq!(orders, 1);
    assert_eq!(*obs.skipped.lock().unwrap(), vec![2, 2]);
    let finished = obs.finished.lock().unwrap();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].rows_read, 3);
    assert_eq!(finished[0].rows_skipped, 2);
    assert_eq!(finished[0].skipped.len(), 2);
}

#[test]
fn failing_later_file_reports_no_completion() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("a.csv"),
        "Order Date,Ship Date,Market,Category,Sub-Category,Sales,Profit,Discount\n\
         03/01/2023,03/02/2023,US,Technology,Phones,1,1,0\n",
    )
    .unwrap();
    fs::write(dir.path().join("b.csv"), "Sales,Profit\n1,1\n").unwrap();

    let obs = Arc::new(RecordingObserver::default());
    let source = OrderSource::Directory(dir.path().to_path_buf());
    let results: Vec<_> = stream_orders(&source, &options_with(&obs)).unwrap().collect();

    assert!(results[1].is_err());
    assert!(obs.finished.lock().unwrap().is_empty());
    assert_eq!(*obs.failures.lock().unwrap(), vec![StreamSeverity::Error]);
}

#[test]
fn composite_and_file_observers_fan_out() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("stream.log");
    let recording = Arc::new(RecordingObserver::default());
    let observers: Vec<Arc<dyn StreamObserver>> = vec![recording.clone(), Arc::new(FileObserver::new(&log))];
    let composite = CompositeObserver::new(observers);
    let opts = StreamOptions {
        observer: Some(Arc::new(composite)),
        ..Default::default()
    };

    let source = OrderSource::from("tests/fixtures/orders_bad_date.csv");
    let _ = stream_orders(&source, &opts).unwrap().count();

    assert_eq!(recording.skipped.lock().unwrap().len(), 1);
    let contents = fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(" skip "));
    assert!(lines[0].contains("raw='2023-01-05'"));
    assert!(lines[1].contains(" ok "));
    assert!(lines[1].contains("skipped=1"));
}
