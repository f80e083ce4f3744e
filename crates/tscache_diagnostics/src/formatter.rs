//! Formatting normalized diagnostics into host-reportable messages.

use crate::message::DiagnosticMessage;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A formatted message ready to be reported to the build host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedMessage {
    /// Rendered message text.
    pub message: String,
    /// Severity deciding whether the host sees an error or a warning.
    pub severity: Severity,
}

impl ReportedMessage {
    /// Creates a reported message.
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    /// Returns `true` if the host should receive this as an error.
    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }
}

/// Converts normalized diagnostics into reported messages.
pub trait DiagnosticFormatter: Send + Sync {
    /// Formats a single diagnostic.
    fn format(&self, message: &DiagnosticMessage) -> ReportedMessage;
}

/// Renders `(<line>,<character>): <content>` for file diagnostics and the
/// bare content otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFormatter;

impl DiagnosticFormatter for DefaultFormatter {
    fn format(&self, message: &DiagnosticMessage) -> ReportedMessage {
        let text = match (&message.file, message.line, message.character) {
            (Some(_), Some(line), Some(character)) => {
                format!("({line},{character}): {}", message.content)
            }
            _ => message.content.clone(),
        };
        ReportedMessage::new(text, message.severity)
    }
}

/// The failure descriptor lint formatters consume.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LintFailure {
    /// Failure text.
    pub failure: String,
    /// `file:line:character`, one-based.
    pub file_name: String,
    /// Name of the rule that fired.
    pub rule_name: String,
    /// Full source text of the file.
    pub raw_lines: String,
    /// Severity of the rule.
    pub rule_severity: Severity,
    /// Zero-based line.
    pub line: u32,
    /// Zero-based character.
    pub character: u32,
}

impl LintFailure {
    /// Adapts a normalized diagnostic. The diagnostic's `source` becomes the rule name.
    pub fn from_message(message: &DiagnosticMessage) -> Self {
        let line = message.line.unwrap_or(0);
        let character = message.character.unwrap_or(0);
        Self {
            failure: message.content.clone(),
            file_name: format!(
                "{}:{}:{}",
                message.file.as_deref().unwrap_or_default(),
                line + 1,
                character + 1
            ),
            rule_name: message.source.clone(),
            raw_lines: message.raw_text.clone(),
            rule_severity: message.severity,
            line,
            character,
        }
    }
}

/// A named output formatter of a lint library.
pub trait LintFormatter: Send + Sync {
    /// Renders a batch of failures.
    fn format(&self, failures: &[LintFailure]) -> String;
}

/// Formats diagnostics through a lint library's formatter.
pub struct LintAdapterFormatter {
    inner: Box<dyn LintFormatter>,
}

impl LintAdapterFormatter {
    /// Wraps a lint formatter.
    pub fn new(inner: Box<dyn LintFormatter>) -> Self {
        Self { inner }
    }
}

impl DiagnosticFormatter for LintAdapterFormatter {
    fn format(&self, message: &DiagnosticMessage) -> ReportedMessage {
        let failure = LintFailure::from_message(message);
        let mut text = self.inner.format(std::slice::from_ref(&failure));
        // Lint formatters terminate their output with a blank line.
        if text.ends_with("\n\n") {
            text.truncate(text.len() - 2);
        }
        ReportedMessage::new(text, message.severity)
    }
}
