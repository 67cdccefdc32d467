//! External integration error types.
//!
//! Each third-party client translates transport and HTTP failures into the
//! small taxonomy below, so pipelines can branch on condition rather than
//! status code.

/// Specific error conditions for external integration clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum IntegrationErrorKind {
    /// Keyword-research API rejected the static API key
    #[display("Invalid API key")]
    InvalidApiKey,
    /// CMS rejected the configured credentials
    #[display("CMS credentials invalid")]
    CredentialsInvalid,
    /// CMS user lacks the capability for this operation
    #[display("Insufficient permission: {}", _0)]
    InsufficientPermission(String),
    /// CMS REST endpoint missing or disabled
    #[display("REST endpoint not found - is it enabled? ({})", _0)]
    EndpointNotFound(String),
    /// Site or API host could not be reached
    #[display("Cannot reach site: {}", _0)]
    Unreachable(String),
    /// Business-profile API denied access even after a token refresh
    #[display("Access denied: {}", _0)]
    AccessDenied(String),
    /// OAuth refresh-token exchange failed; the account is now disconnected
    #[display("Token refresh failed: {}", _0)]
    TokenRefreshFailed(String),
    /// No stored token set for the account
    #[display("No OAuth tokens stored for account {}", _0)]
    TokensMissing(String),
    /// Provider returned an error status that maps to no finer condition
    #[display("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body or status text
        message: String,
    },
    /// Retries exhausted for a retryable failure
    #[display("Retries exhausted: {}", _0)]
    RetriesExhausted(String),
    /// Response body did not match the expected shape
    #[display("Unexpected response shape: {}", _0)]
    UnexpectedResponse(String),
}

/// Error type for external integration operations.
///
/// # Examples
///
/// ```
/// use drumbeat_error::{IntegrationError, IntegrationErrorKind};
///
/// let err = IntegrationError::new(IntegrationErrorKind::InvalidApiKey);
/// assert!(format!("{}", err).contains("Invalid API key"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Integration Error: {} at line {} in {}", kind, line, file)]
pub struct IntegrationError {
    /// The specific error condition
    pub kind: IntegrationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl IntegrationError {
    /// Create a new IntegrationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: IntegrationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
