//! Error types for option validation and compiler configuration loading.

use std::fmt;
use std::path::PathBuf;

/// Which kind of compiler configuration file is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    /// A TypeScript project configuration (`tsconfig`).
    Tsconfig,
    /// A JavaScript project configuration (`jsconfig`); implies `allowJs`.
    Jsconfig,
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKind::Tsconfig => write!(f, "tsconfig"),
            ConfigKind::Jsconfig => write!(f, "jsconfig"),
        }
    }
}

/// Errors raised before any compilation begins.
///
/// All of them are fatal for the process: compiler options are computed once
/// and a failure is reported again on every subsequent invocation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The compiler configuration file does not exist.
    #[error("({loader}) {kind} file {} couldn't be found", path.display())]
    ConfigNotFound {
        /// Name of the loader reporting the error.
        loader: String,
        /// Which configuration kind was expected.
        kind: ConfigKind,
        /// The resolved path that was checked.
        path: PathBuf,
    },

    /// The lint configuration file does not exist.
    #[error("({loader}) tslint file {} couldn't be found", path.display())]
    LintConfigNotFound {
        /// Name of the loader reporting the error.
        loader: String,
        /// The resolved path that was checked.
        path: PathBuf,
    },

    /// The compiler configuration could not be read or parsed.
    #[error("({loader}) {reason} in {}", path.display())]
    Parse {
        /// Name of the loader reporting the error.
        loader: String,
        /// Description of the failure.
        reason: String,
        /// The configuration file path.
        path: PathBuf,
    },

    /// The loader options violate the option schema.
    #[error("({loader}) invalid options: {reason}")]
    InvalidOptions {
        /// Name of the loader reporting the error.
        loader: String,
        /// Description of the violation.
        reason: String,
    },

    /// An I/O error occurred while reading an options file.
    #[error("failed to read options: {0}")]
    Io(#[from] std::io::Error),
}
