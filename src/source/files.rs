//! File-backed sources: single paths, glob patterns and directories.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::Order;

use super::csv::OrderStream;
use super::observability::{notify_finished, StreamContext, StreamReport};
use super::unified::{OrderSource, StreamOptions};

impl OrderSource {
    /// The files this source reads, in the order they will be streamed.
    ///
    /// A [`OrderSource::Path`] is returned as-is (opening it reports whether it exists). Glob and
    /// directory sources must match at least one file.
    pub fn resolve(&self) -> AnalyticsResult<Vec<PathBuf>> {
        match self {
            Self::Path(path) => Ok(vec![path.clone()]),
            Self::Glob(pattern) => {
                let mut paths = Vec::new();
                for entry in glob::glob(pattern)? {
                    let path = entry?;
                    if path.is_file() {
                        paths.push(path);
                    }
                }
                non_empty(paths, || format!("pattern '{pattern}' matched no files"))
            }
            Self::Directory(dir) => {
                let mut paths = Vec::new();
                for entry in WalkDir::new(dir).sort_by_file_name() {
                    let entry = entry?;
                    if entry.file_type().is_file() && has_csv_extension(entry.path()) {
                        paths.push(entry.into_path());
                    }
                }
                non_empty(paths, || format!("directory '{}' holds no .csv files", dir.display()))
            }
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn non_empty(
    mut paths: Vec<PathBuf>,
    message: impl FnOnce() -> String,
) -> AnalyticsResult<Vec<PathBuf>> {
    if paths.is_empty() {
        return Err(AnalyticsError::NoInputFiles { message: message() });
    }
    paths.sort();
    Ok(paths)
}

/// Order stream over one or more files, read back to back.
///
/// At most one file is open at any time. A file is closed as soon as its last row is read, when
/// the stream fails, or when the stream is dropped.
///
/// Completion is reported once for the whole source, with the merged report, after the last file
/// is exhausted.
pub struct FileOrderStream {
    ctx: StreamContext,
    pending: std::vec::IntoIter<PathBuf>,
    current: Option<OrderStream<File>>,
    options: StreamOptions,
    completed: StreamReport,
    done: bool,
}

impl FileOrderStream {
    pub(crate) fn open(
        ctx: StreamContext,
        paths: Vec<PathBuf>,
        options: &StreamOptions,
    ) -> AnalyticsResult<Self> {
        let mut stream = Self {
            ctx,
            pending: paths.into_iter(),
            current: None,
            options: options.clone(),
            completed: StreamReport::default(),
            done: false,
        };
        stream.current = stream.open_next()?;
        Ok(stream)
    }

    fn open_next(&mut self) -> AnalyticsResult<Option<OrderStream<File>>> {
        let Some(path) = self.pending.next() else {
            return Ok(None);
        };
        let mut stream = OrderStream::from_path(path, &self.options)?;
        stream.defer_finish();
        Ok(Some(stream))
    }

    fn retire_current(&mut self) {
        if let Some(done) = self.current.take() {
            self.completed
                .merge(&done.into_report(), self.options.max_logged_errors);
        }
    }

    /// Combined report over every file read so far.
    pub fn report(&self) -> StreamReport {
        let mut report = self.completed.clone();
        if let Some(current) = &self.current {
            report.merge(current.report(), self.options.max_logged_errors);
        }
        report
    }
}

impl fmt::Debug for FileOrderStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileOrderStream")
            .field("current", &self.current)
            .field("pending", &self.pending.as_slice())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl Iterator for FileOrderStream {
    type Item = AnalyticsResult<Order>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            let current = self.current.as_mut()?;
            match current.next() {
                Some(Ok(order)) => return Some(Ok(order)),
                Some(Err(err)) => {
                    self.done = true;
                    self.retire_current();
                    return Some(Err(err));
                }
                None => {
                    self.retire_current();
                    match self.open_next() {
                        Ok(Some(next)) => self.current = Some(next),
                        Ok(None) => {
                            self.done = true;
                            notify_finished(&self.options, &self.ctx, &self.completed);
                            return None;
                        }
                        Err(err) => {
                            self.done = true;
                            return Some(Err(err));
                        }
                    }
                }
            }
        }
    }
}
