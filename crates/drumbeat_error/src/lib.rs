//! Error types for the Drumbeat workspace.
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use drumbeat_error::{DrumbeatResult, HttpError};
//!
//! fn fetch_data() -> DrumbeatResult<String> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod completion;
mod config;
mod error;
mod http;
mod integration;
mod json;
mod pipeline;
mod store;

pub use completion::CompletionError;
pub use config::ConfigError;
pub use error::{DrumbeatError, DrumbeatErrorKind, DrumbeatResult};
pub use http::HttpError;
pub use integration::{IntegrationError, IntegrationErrorKind};
pub use json::JsonError;
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use store::{StoreError, StoreErrorKind};
