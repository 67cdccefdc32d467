//! Top-level error wrapper types.

use crate::{
    CompletionError, ConfigError, HttpError, IntegrationError, JsonError, PipelineError,
    StoreError,
};

/// Foundation error enum for the Drumbeat workspace.
///
/// # Examples
///
/// ```
/// use drumbeat_error::{DrumbeatError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: DrumbeatError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum DrumbeatErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Completion-service error
    #[from(CompletionError)]
    Completion(CompletionError),
    /// External integration error
    #[from(IntegrationError)]
    Integration(IntegrationError),
    /// Pipeline error
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Store error
    #[from(StoreError)]
    Store(StoreError),
}

/// Drumbeat error with kind discrimination.
///
/// # Examples
///
/// ```
/// use drumbeat_error::{DrumbeatResult, ConfigError};
///
/// fn might_fail() -> DrumbeatResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Drumbeat Error: {}", _0)]
pub struct DrumbeatError(Box<DrumbeatErrorKind>);

impl DrumbeatError {
    /// Create a new error from a kind.
    pub fn new(kind: DrumbeatErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &DrumbeatErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to DrumbeatErrorKind
impl<T> From<T> for DrumbeatError
where
    T: Into<DrumbeatErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Drumbeat operations.
///
/// # Examples
///
/// ```
/// use drumbeat_error::{DrumbeatResult, HttpError};
///
/// fn fetch_data() -> DrumbeatResult<String> {
///     Err(HttpError::new("404 Not Found"))?
/// }
/// ```
pub type DrumbeatResult<T> = std::result::Result<T, DrumbeatError>;
