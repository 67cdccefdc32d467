//! Core data types for the Drumbeat workspace.
//!
//! This crate defines the shared domain model: run records, content pieces,
//! review queue items, keywords, compliance details, account profiles, and
//! the completion-service request/response types. It carries no I/O; stores
//! and clients live in their own crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod account;
mod completion;
mod compliance;
mod content;
pub mod extraction;
mod keyword;
mod queue;
mod run;
pub mod telemetry;
mod topic;

pub use account::{AccountHealth, AccountProfile, CmsCredentials, TokenSet};
pub use completion::{
    ChatMessage, CompletionRequest, CompletionRequestBuilder, CompletionResponse, Role,
};
pub use compliance::{ComplianceDetail, ComplianceReport, ComplianceSeverity, ComplianceStatus};
pub use content::{ContentPiece, ContentStatus};
pub use keyword::{Keyword, KeywordKind, KeywordMetrics, KeywordPosition, SearchPerformanceRow};
pub use queue::{QueueAction, QueueSeverity, QueueStatus, ReviewQueueItem};
pub use run::{PipelineName, Run, RunStatus};
pub use topic::Topic;
