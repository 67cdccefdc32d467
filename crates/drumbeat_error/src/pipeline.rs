//! Pipeline error types.

/// Specific error conditions for pipeline and conductor runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PipelineErrorKind {
    /// Malformed input rejected before any stage ran
    #[display("Validation failed: {}", _0)]
    Validation(String),
    /// Caller lacks the capability for this pipeline entry point
    #[display("Not authorized: {}", _0)]
    Authorization(String),
    /// Referenced account, content piece, or queue item does not exist
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// A stage failed; fatal to the current run only
    #[display("Stage '{stage}' failed: {message}")]
    StageFailed {
        /// Stage name
        stage: String,
        /// Error message
        message: String,
    },
    /// Queue item is not in the status a transition requires
    #[display("Queue item {id}: {message}")]
    InvalidTransition {
        /// Queue item id
        id: String,
        /// Why the transition was rejected
        message: String,
    },
}

/// Error type for pipeline operations.
///
/// # Examples
///
/// ```
/// use drumbeat_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::Validation("empty topic".into()));
/// assert!(format!("{}", err).contains("empty topic"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific error condition
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
