//! Error types for the compiler-service layer.

use std::path::PathBuf;
use tscache_common::InternalError;

/// Errors raised while driving the compiler service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    /// The compiler broke its contract, e.g. emitted no `.js` output.
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// A file could not be put under watch. Watching is best-effort, so
    /// callers log this and carry on.
    #[error("cannot watch {path}: {reason}")]
    Watch {
        /// The file that could not be watched.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// An operation referred to a file that was never registered.
    #[error("file {0} is not registered")]
    UnknownFile(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_is_transparent() {
        let err = ServiceError::from(InternalError::new("no .js output for a.ts"));
        assert_eq!(err.to_string(), "internal error: no .js output for a.ts");
    }

    #[test]
    fn unknown_file_display() {
        let err = ServiceError::UnknownFile("/src/a.ts".to_string());
        assert_eq!(err.to_string(), "file /src/a.ts is not registered");
    }
}
