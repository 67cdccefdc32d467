//! Completion-service error types.

/// Error from the language-model completion service.
///
/// Covers transport failures, provider-side errors, and responses the
/// caller could not interpret (e.g. missing or malformed JSON payloads).
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Completion Error: {} at line {} in {}", message, line, file)]
pub struct CompletionError {
    /// The underlying error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl CompletionError {
    /// Create a new CompletionError with the given message at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
