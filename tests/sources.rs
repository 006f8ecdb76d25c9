use std::fs;
use std::path::Path;

use order_analytics::analytics::{OrderAnalytics, YearMarketCategory};
use order_analytics::source::{stream_orders, stream_orders_from_reader, OrderSource, ParseErrorPolicy, StreamOptions};
use order_analytics::AnalyticsError;

const HEADER: &str = "Order Date,Ship Date,Market,Category,Sub-Category,Sales,Profit,Discount\n";

fn write_orders(path: &Path, rows: &[&str]) {
    let mut body = HEADER.to_string();
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    fs::write(path, body).unwrap();
}

#[test]
fn glob_source_reads_matching_files_in_path_order() {
    let dir = tempfile::tempdir().unwrap();
    write_orders(
        &dir.path().join("orders-2023.csv"),
        &["01/05/2023,01/07/2023,US,Furniture,Chairs,30,3,0"],
    );
    write_orders(
        &dir.path().join("orders-2022.csv"),
        &[
            "01/05/2022,01/07/2022,US,Furniture,Chairs,10,1,0",
            "02/05/2022,02/07/2022,US,Furniture,Chairs,20,2,0",
        ],
    );
    fs::write(dir.path().join("notes.txt"), "not orders").unwrap();

    let pattern = dir.path().join("orders-*.csv").to_string_lossy().into_owned();
    let mut stream = stream_orders(&OrderSource::Glob(pattern), &StreamOptions::default()).unwrap();
    let years: Vec<i32> = stream.by_ref().map(|o| o.unwrap().year()).collect();

    assert_eq!(years, vec![2022, 2022, 2023]);
    assert_eq!(stream.report().rows_read, 3);
}

#[test]
fn directory_source_aggregates_across_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("eu")).unwrap();
    write_orders(
        &dir.path().join("us.csv"),
        &[
            "03/01/2023,03/02/2023,US,Technology,Phones,100,10,0",
            "bad-date,03/02/2023,US,Technology,Phones,100,10,0",
        ],
    );
    write_orders(
        &dir.path().join("eu").join("q1.csv"),
        &["03/01/2023,03/02/2023,EU,Technology,Phones,40,4,0"],
    );

    let analytics = OrderAnalytics::new(OrderSource::Directory(dir.path().to_path_buf()), StreamOptions::default());
    let out = analytics.sales_by_year_market_category().unwrap();

    assert_eq!(out.value[&YearMarketCategory::new(2023, "US", "Technology")], 100.0);
    assert_eq!(out.value[&YearMarketCategory::new(2023, "EU", "Technology")], 40.0);
    assert_eq!(out.report.rows_read, 3);
    assert_eq!(out.report.rows_skipped, 1);
    assert_eq!(out.report.skipped[0].row, 3);
}

#[test]
fn fail_fast_stops_before_later_files() {
    let dir = tempfile::tempdir().unwrap();
    write_orders(&dir.path().join("a.csv"), &["oops,03/02/2023,US,Technology,Phones,1,1,0"]);
    write_orders(&dir.path().join("b.csv"), &["03/01/2023,03/02/2023,US,Technology,Phones,1,1,0"]);

    let opts = StreamOptions {
        policy: ParseErrorPolicy::FailFast,
        ..Default::default()
    };
    let mut stream = stream_orders(&OrderSource::Directory(dir.path().to_path_buf()), &opts).unwrap();

    assert!(matches!(stream.next(), Some(Err(AnalyticsError::Parse(_)))));
    assert!(stream.next().is_none());
    assert_eq!(stream.report().rows_read, 1);
}

#[test]
fn later_file_with_bad_header_fails_the_stream() {
    let dir = tempfile::tempdir().unwrap();
    write_orders(&dir.path().join("a.csv"), &["03/01/2023,03/02/2023,US,Technology,Phones,1,1,0"]);
    fs::write(dir.path().join("b.csv"), "Sales,Profit\n1,1\n").unwrap();

    let results: Vec<_> = stream_orders(&OrderSource::Directory(dir.path().to_path_buf()), &StreamOptions::default())
        .unwrap()
        .collect();

    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(AnalyticsError::SchemaMismatch { .. })));
}

#[test]
fn empty_directory_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = stream_orders(&OrderSource::Directory(dir.path().to_path_buf()), &StreamOptions::default())
        .unwrap_err();
    assert!(matches!(err, AnalyticsError::NoInputFiles { .. }));
}

#[test]
fn skipped_rows_name_the_file_they_came_from() {
    let dir = tempfile::tempdir().unwrap();
    write_orders(&dir.path().join("a.csv"), &["bad,03/02/2023,US,Technology,Phones,1,1,0"]);
    write_orders(&dir.path().join("b.csv"), &["bad,03/02/2023,EU,Technology,Phones,1,1,0"]);

    let mut stream = stream_orders(&OrderSource::Directory(dir.path().to_path_buf()), &StreamOptions::default())
        .unwrap();
    assert!(stream.next().is_none());

    let report = stream.report();
    assert_eq!(report.rows_skipped, 2);
    let files: Vec<_> = report.skipped.iter().map(|e| e.file.clone()).collect();
    assert_eq!(files, vec![Some(dir.path().join("a.csv")), Some(dir.path().join("b.csv"))]);
    assert!(report.skipped.iter().all(|e| e.row == 2));
}

#[test]
fn reader_rows_have_no_file() {
    let csv = format!("{HEADER}bad,03/02/2023,US,Technology,Phones,1,1,0\n");
    let mut stream = stream_orders_from_reader(csv.as_bytes(), &StreamOptions::default()).unwrap();
    assert!(stream.next().is_none());
    assert_eq!(stream.report().skipped[0].file, None);
}
