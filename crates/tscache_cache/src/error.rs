//! Error types for cache operations.

use std::path::PathBuf;
use tscache_common::Mtime;

/// Errors that can occur during cache operations.
///
/// None of these fail a build. A read-side error turns into a cache miss and
/// a write-side error into a dropped entry; callers log the reason.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing a cache file.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A cache file could not be parsed as a cache entry.
    #[error("failed to parse cache entry {path}: {reason}")]
    Parse {
        /// The cache file path.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A cache entry could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// A dependency could not be stat'ed, usually because it was deleted.
    #[error("cannot stat dependency {path}: {source}")]
    Stat {
        /// The dependency path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A dependency was modified after the entry was recorded.
    #[error("dependency {path} changed: recorded {recorded}, now {current}")]
    MtimeMismatch {
        /// The dependency path.
        path: PathBuf,
        /// Modification time stored in the entry.
        recorded: Mtime,
        /// Modification time found on disk.
        current: Mtime,
    },

    /// The entry was written for a different request string.
    #[error("cache entry belongs to request `{stored}`, not `{requested}`")]
    RequestMismatch {
        /// The request stored in the entry.
        stored: String,
        /// The request being served.
        requested: String,
    },
}
