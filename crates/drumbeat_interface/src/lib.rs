//! Trait seams between Drumbeat pipelines and their collaborators.
//!
//! The pipelines never talk to a concrete database, LLM provider, or HTTP
//! client directly; they receive implementations of the traits defined
//! here, constructed once at process start. Tests substitute fakes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clients;
mod driver;
mod stores;

pub use clients::{ContentPublisher, KeywordResearch, PublishedPost, SearchPerformanceSource};
pub use driver::CompletionDriver;
pub use stores::{AccountStore, ContentStore, KeywordStore, ReviewQueueStore, RunStore, TokenStore};
