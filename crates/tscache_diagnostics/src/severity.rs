//! Diagnostic severity levels ordered from least to most severe.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity of a diagnostic, as reported by the compiler's category.
///
/// Displayed and serialized in lower case (`"error"`, `"warning"`, ...).
/// Only [`Error`](Severity::Error) is reported to the host as an error;
/// every other level is reported as a warning.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// An informational message.
    Message,
    /// A suggestion that doesn't indicate a problem.
    Suggestion,
    /// A potential issue that doesn't prevent emission.
    Warning,
    /// A definite problem. Emission still happens.
    Error,
}

impl Severity {
    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    /// Returns the lower-cased name of this severity.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Message => "message",
            Severity::Suggestion => "suggestion",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
