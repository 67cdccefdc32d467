//! Typed clients for Drumbeat's third-party integrations.
//!
//! All clients share the same pattern: construct with account-scoped
//! credentials, expose typed async methods, and translate transport/HTTP
//! failures into the `IntegrationErrorKind` taxonomy. Sub-requests across
//! lists run sequentially so rate-limit backoff and partial-failure
//! bookkeeping stay deterministic.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod anthropic;
mod cms;
mod keyword_api;
mod oauth;
mod profile;

pub use anthropic::AnthropicDriver;
pub use cms::{CmsClient, CmsInfo, CmsPost, CmsPostStatus, CmsPublisher, NewCmsPost, UpdateCmsPost};
pub use keyword_api::{KeywordApiClient, TrackingBatchReport};
pub use oauth::{OAuthConfig, TokenManager};
pub use profile::{
    CallToAction, InsightsSummary, Location, NewProfilePost, ProfileClient,
    ProfilePerformanceSource, ProfilePost, Review, TopicType,
};
