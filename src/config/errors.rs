use std::path::PathBuf;

use thiserror::Error;

/// Errors that may occur while loading the configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No usable data directory found.
    #[error("No suitable config directory found")]
    NoConfigDir,
    /// Failed to create the config directory.
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        /// Directory path that failed to create.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to read the config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to write the default config file.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Path that failed to write.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The document is not valid configuration JSON.
    #[error("Invalid config{}: {source}", .path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    ParseJson {
        /// JSON file path, when parsed from disk.
        path: Option<PathBuf>,
        /// JSON parse error.
        source: serde_json::Error,
    },
    /// The filename pattern does not compile.
    #[error("Invalid filenameRegex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        source: Box<regex::Error>,
    },
    /// The filename pattern lacks the identifier/file-use/date groups.
    #[error("filenameRegex {pattern:?} needs 3 capture groups, found {found}")]
    MissingCaptureGroups { pattern: String, found: usize },
}
