//! Diagnostic normalization and formatting.
//!
//! Compilers hand back [`RawDiagnostic`] values in their own shape. This crate
//! normalizes them into a uniform [`DiagnosticMessage`], formats those into
//! host-reportable [`ReportedMessage`]s through a pluggable
//! [`DiagnosticFormatter`].

#![warn(missing_docs)]

pub mod formatter;
pub mod message;
pub mod raw;
pub mod severity;

pub use formatter::{
    DefaultFormatter, DiagnosticFormatter, LintAdapterFormatter, LintFailure, LintFormatter,
    ReportedMessage,
};
pub use message::{DiagnosticKind, DiagnosticMessage};
pub use raw::{DiagnosticFile, MessageChain, RawDiagnostic};
pub use severity::Severity;
