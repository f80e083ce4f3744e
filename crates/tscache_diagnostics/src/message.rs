//! The normalized diagnostic record.

use crate::raw::RawDiagnostic;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// Producer fallback used when a diagnostic carries no `source`.
pub const DEFAULT_SOURCE: &str = "diagnostic";

/// Discriminator for normalized records. There is a single kind today.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// A compiler or lint diagnostic.
    Diagnostic,
}

/// A compiler diagnostic in uniform shape.
///
/// `line` and `character` are zero-based and only present for diagnostics
/// attached to a file; global diagnostics (e.g. compiler-option errors)
/// carry neither.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticMessage {
    /// Always [`DiagnosticKind::Diagnostic`].
    #[serde(rename = "type")]
    pub kind: DiagnosticKind,
    /// Numeric diagnostic code.
    pub code: u32,
    /// Path of the file the diagnostic belongs to.
    pub file: Option<String>,
    /// Full text of that file, or empty for global diagnostics.
    pub raw_text: String,
    /// Zero-based line of the diagnostic start.
    pub line: Option<u32>,
    /// Zero-based character of the diagnostic start within its line.
    pub character: Option<u32>,
    /// Severity derived from the compiler category.
    pub severity: Severity,
    /// Producer of the diagnostic; [`DEFAULT_SOURCE`] when the compiler gave none.
    pub source: String,
    /// The flattened message text.
    pub content: String,
}

impl DiagnosticMessage {
    /// Normalizes a compiler diagnostic.
    pub fn from_raw(raw: &RawDiagnostic) -> Self {
        let position = match (&raw.file, raw.start) {
            (Some(file), Some(start)) => Some(file.line_and_character(start)),
            _ => None,
        };
        Self {
            kind: DiagnosticKind::Diagnostic,
            code: raw.code,
            file: raw.file.as_ref().map(|f| f.path.to_string_lossy().into_owned()),
            raw_text: raw
                .file
                .as_ref()
                .map(|f| f.text.to_string())
                .unwrap_or_default(),
            line: position.map(|(line, _)| line),
            character: position.map(|(_, character)| character),
            severity: raw.category,
            source: raw
                .source
                .clone()
                .unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            content: raw.message.flatten(),
        }
    }
}
