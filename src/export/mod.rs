//! Transcriptions of file metadata into other formats and tool invocations.

pub mod csv_rows;
pub mod lame;
pub mod ohms;
pub mod pbcore;
pub mod splice;

use std::path::{Path, PathBuf};

use crate::bwf::BwfError;

pub use splice::SpliceError;

/// Errors raised while exporting.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Bwf(#[from] BwfError),
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// An external encoder exited unsuccessfully.
    #[error("{program} exited with status {code:?}: {stderr}")]
    ToolFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    /// A label line lacks a start time or title.
    #[error("{}:{line}: {reason}", .path.display())]
    InvalidLabel {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file that could not be exported; the rest of the batch went on.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: ExportError,
}

/// Outcome of exporting several files, one failure per skipped file.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Input files exported, in order.
    pub processed: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, path: &Path, result: Result<(), ExportError>) {
        match result {
            Ok(()) => self.processed.push(path.to_path_buf()),
            Err(error) => {
                tracing::error!("{}: {error}", path.display());
                self.failures.push(FileFailure {
                    path: path.to_path_buf(),
                    error,
                });
            }
        }
    }
}

/// `path` with its extension replaced by `suffix` (`a/b.wav` + `.mp3` = `a/b.mp3`).
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{suffix}"))
}
