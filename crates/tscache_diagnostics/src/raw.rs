//! Diagnostics in the shape the compiler produces them.

use crate::severity::Severity;
use std::path::PathBuf;
use std::sync::Arc;
use tscache_source::LineIndex;

/// The source file a diagnostic is attached to.
#[derive(Debug, Clone)]
pub struct DiagnosticFile {
    /// Path of the file as the compiler knows it.
    pub path: PathBuf,
    /// Full text the compiler analyzed.
    pub text: Arc<str>,
    /// Line index over `text`, used for position mapping.
    pub line_index: Arc<LineIndex>,
}

impl DiagnosticFile {
    /// Creates a file record, indexing `text`.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let line_index = Arc::new(LineIndex::new(&text));
        Self {
            path: path.into(),
            text,
            line_index,
        }
    }

    /// Maps an absolute UTF-16 offset to zero-based `(line, character)`.
    pub fn line_and_character(&self, offset: u32) -> (u32, u32) {
        self.line_index.line_and_character(offset)
    }
}

/// A possibly nested diagnostic message.
///
/// Compilers elaborate a headline message with a chain of follow-up
/// explanations. Each nesting level is one part of the flattened text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageChain {
    /// Text of this part.
    pub text: String,
    /// Follow-up parts, one level deeper.
    pub next: Vec<MessageChain>,
}

impl MessageChain {
    /// A message with no follow-up parts.
    pub fn leaf(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next: Vec::new(),
        }
    }

    /// Appends a follow-up part.
    pub fn with_next(mut self, next: MessageChain) -> Self {
        self.next.push(next);
        self
    }

    /// Flattens the chain into a single string.
    ///
    /// Parts are joined with `"\n"`; every nested part is indented by two
    /// spaces per level of depth.
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        self.flatten_into(&mut out, 0);
        out
    }

    fn flatten_into(&self, out: &mut String, depth: usize) {
        if depth > 0 {
            out.push('\n');
            out.push_str(&"  ".repeat(depth));
        }
        out.push_str(&self.text);
        for child in &self.next {
            child.flatten_into(out, depth + 1);
        }
    }
}

impl From<&str> for MessageChain {
    fn from(text: &str) -> Self {
        Self::leaf(text)
    }
}

impl From<String> for MessageChain {
    fn from(text: String) -> Self {
        Self::leaf(text)
    }
}

/// A diagnostic as reported by the compiler or a lint provider.
#[derive(Debug, Clone)]
pub struct RawDiagnostic {
    /// Numeric diagnostic code.
    pub code: u32,
    /// The file the diagnostic belongs to; `None` for global diagnostics.
    pub file: Option<DiagnosticFile>,
    /// Absolute start offset within `file`, in UTF-16 code units.
    pub start: Option<u32>,
    /// Length of the offending range in UTF-16 code units.
    pub length: Option<u32>,
    /// The compiler's category for this diagnostic.
    pub category: Severity,
    /// Producer of the diagnostic (e.g. a lint rule name).
    pub source: Option<String>,
    /// The message text, possibly nested.
    pub message: MessageChain,
}

impl RawDiagnostic {
    /// A diagnostic not attached to any file.
    pub fn global(code: u32, category: Severity, message: impl Into<MessageChain>) -> Self {
        Self {
            code,
            file: None,
            start: None,
            length: None,
            category,
            source: None,
            message: message.into(),
        }
    }

    /// A diagnostic attached to a range of `file`.
    pub fn in_file(
        code: u32,
        category: Severity,
        file: DiagnosticFile,
        start: u32,
        length: u32,
        message: impl Into<MessageChain>,
    ) -> Self {
        Self {
            code,
            file: Some(file),
            start: Some(start),
            length: Some(length),
            category,
            source: None,
            message: message.into(),
        }
    }

    /// Sets the producer name.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}
