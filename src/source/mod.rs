//! Row sources and the order parser.
//!
//! Most callers should use [`stream_orders`] (from [`unified`]) which:
//!
//! - resolves an [`OrderSource`] (file, glob, directory) and opens one file at a time
//! - parses each row into a validated [`crate::types::Order`] lazily, one row per `next()`
//! - applies the configured [`ParseErrorPolicy`] and keeps a [`StreamReport`]
//! - optionally reports skips, warnings and failures to a [`StreamObserver`]
//!
//! Lower-level pieces are also available under:
//! - [`row`]: [`parse_row`] and the [`RowLookup`] abstraction
//! - [`csv`]: [`OrderStream`] over any `Read`
//! - [`files`]: multi-file [`FileOrderStream`]

pub mod csv;
pub mod files;
pub mod observability;
pub mod row;
pub mod unified;

pub use self::csv::OrderStream;
pub use files::FileOrderStream;
pub use observability::{
    CompositeObserver, DataWarning, FileObserver, StreamContext, StreamObserver, StreamReport, StreamSeverity,
};
pub use row::{normalize_header, parse_row, ColumnAliases, OrderColumn, RowLookup};
pub use unified::{
    stream_orders, stream_orders_from_reader, stream_rows, OrderSource, ParseErrorPolicy, RowStream, StreamOptions,
    DEFAULT_DATE_FORMAT,
};
