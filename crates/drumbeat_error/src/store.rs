//! Store error types.

/// Specific error conditions for persistence stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StoreErrorKind {
    /// Requested record does not exist
    #[display("Record not found: {}", _0)]
    NotFound(String),
    /// Attempt to mutate a run that already reached a terminal status
    #[display("Run {} is terminal and cannot be mutated", _0)]
    RunTerminal(String),
    /// Status transition violates the record's lifecycle
    #[display("Invalid status transition: {}", _0)]
    InvalidTransition(String),
    /// Backend-specific failure (connection, serialization, constraint)
    #[display("Store backend error: {}", _0)]
    Backend(String),
}

/// Error type for store operations.
///
/// # Examples
///
/// ```
/// use drumbeat_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::NotFound("run 42".into()));
/// assert!(format!("{}", err).contains("run 42"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The specific error condition
    pub kind: StoreErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl StoreError {
    /// Create a new StoreError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
