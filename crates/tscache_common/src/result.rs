//! The internal error type shared by the tscache workspace.

/// An internal error indicating a broken invariant, not a user input problem.
///
/// It signals a bug in tscache or in the compiler it drives. User errors such
/// as type errors are reported as diagnostics instead.
#[derive(Debug, Clone, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
