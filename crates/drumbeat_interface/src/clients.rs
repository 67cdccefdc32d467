//! Trait seams for the external integration clients the pipelines consume.
//!
//! Only the slices the pipelines actually call are abstracted here; the
//! full client surfaces stay concrete in `drumbeat_integrations`.

use async_trait::async_trait;
use drumbeat_core::{AccountProfile, ContentPiece, KeywordMetrics, SearchPerformanceRow};
use drumbeat_error::DrumbeatResult;
use uuid::Uuid;

/// Keyword research operations the keyword pipeline depends on.
#[async_trait]
pub trait KeywordResearch: Send + Sync {
    /// Research metrics for a list of seed phrases.
    async fn bulk_research(&self, seeds: &[String]) -> DrumbeatResult<Vec<KeywordMetrics>>;

    /// Keywords a competitor domain ranks for.
    async fn competitor_keywords(&self, domain: &str) -> DrumbeatResult<Vec<KeywordMetrics>>;
}

/// Source of an account's own search-performance queries.
#[async_trait]
pub trait SearchPerformanceSource: Send + Sync {
    /// Top queries for the trailing `days`, capped at `limit` rows.
    async fn search_performance(
        &self,
        account_id: Uuid,
        days: u32,
        limit: usize,
    ) -> DrumbeatResult<Vec<SearchPerformanceRow>>;
}

/// Result of publishing a content piece to an account's CMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPost {
    /// Provider post id, kept for unpublish
    pub post_id: u64,
    /// Public URL of the live post
    pub url: String,
}

/// CMS publication seam used by review-queue approval and rollback.
#[async_trait]
pub trait ContentPublisher: Send + Sync {
    /// Publish a piece to the account's CMS.
    async fn publish(
        &self,
        account: &AccountProfile,
        piece: &ContentPiece,
    ) -> DrumbeatResult<PublishedPost>;

    /// Unpublish a previously published post (status downgrade, not delete).
    async fn unpublish(&self, account: &AccountProfile, post_id: u64) -> DrumbeatResult<()>;
}
