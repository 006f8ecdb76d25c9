use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Convenience result type used across streaming and analytics operations.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// A single row that could not be turned into an [`crate::types::Order`].
///
/// Carries enough context (file, row number, column, raw cell) to point a user at the offending input.
/// Under [`crate::source::ParseErrorPolicy::SkipWithLog`] these are collected in the
/// [`crate::source::StreamReport`] instead of aborting the stream.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
pub struct ParseError {
    /// 1-based row number (for CSV input the header is row 1).
    pub row: usize,
    /// Column display name, e.g. `Order Date`.
    pub column: String,
    /// Raw cell content as read from the source.
    pub raw: String,
    /// Human-readable reason.
    pub message: String,
    /// File the row was read from; `None` for caller-supplied readers and in-memory rows.
    pub file: Option<PathBuf>,
}

impl ParseError {
    pub(crate) fn new(
        row: usize,
        column: impl Into<String>,
        raw: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row,
            column: column.into(),
            raw: raw.into(),
            message: message.into(),
            file: None,
        }
    }

    pub(crate) fn in_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }
}

/// Error type returned by streaming, aggregation and query functions.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader error that is not attributable to a single row.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A glob source pattern is malformed.
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A path matched by a glob source could not be read.
    #[error("glob error: {0}")]
    Glob(#[from] glob::GlobError),

    /// A directory source could not be traversed.
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A glob or directory source matched no input files.
    #[error("no input files: {message}")]
    NoInputFiles { message: String },

    /// The input header does not contain every required order column.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A row failed to parse while running under [`crate::source::ParseErrorPolicy::FailFast`].
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Invalid configuration of a stream or aggregation (e.g. top-N with `n == 0`).
    #[error("invalid aggregation configuration: {message}")]
    AggregationPolicy { message: String },

    /// Summary export failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyticsError {
    pub(crate) fn policy(message: impl Into<String>) -> Self {
        Self::AggregationPolicy {
            message: message.into(),
        }
    }

    /// Returns `true` when the source itself could not be opened or read, as opposed to bad
    /// content or bad configuration.
    pub fn is_resource_error(&self) -> bool {
        match self {
            Self::Io(_) | Self::Glob(_) | Self::Walk(_) | Self::NoInputFiles { .. } => true,
            Self::Csv(err) => matches!(err.kind(), csv::ErrorKind::Io(_)),
            Self::Pattern(_)
            | Self::SchemaMismatch { .. }
            | Self::Parse(_)
            | Self::AggregationPolicy { .. }
            | Self::Json(_) => false,
        }
    }
}
