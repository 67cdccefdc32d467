//! Content pieces produced by the content generation pipeline.

use crate::{ComplianceDetail, ComplianceStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a content piece.
///
/// `Draft → InReview → Approved → Published`, or `→ Rejected`, or back to
/// `Approved` via rollback. Pieces are never deleted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContentStatus {
    /// Drafted, not yet queued
    Draft,
    /// Awaiting human review
    InReview,
    /// Approved by a reviewer
    Approved,
    /// Live on the CMS
    Published,
    /// Rejected by a reviewer
    Rejected,
}

/// One candidate or published article with SEO and compliance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPiece {
    /// Unique content id
    pub id: Uuid,
    /// Owning account
    pub account_id: Uuid,
    /// Article title
    pub title: String,
    /// Rendered HTML body
    pub body_html: String,
    /// Markdown mirror of the body
    pub body_markdown: String,
    /// Content type (e.g. "blog_post")
    pub content_type: String,
    /// Lifecycle status
    pub status: ContentStatus,
    /// Primary keyword the piece targets
    pub target_keyword: String,
    /// Secondary keywords woven into the piece
    pub related_keywords: Vec<String>,
    /// Deterministic SEO score, 0-100
    pub seo_score: u8,
    /// Aggregate compliance verdict at queueing time
    pub compliance_status: ComplianceStatus,
    /// Flagged phrases backing the verdict
    pub compliance_details: Vec<ComplianceDetail>,
    /// SEO meta title
    pub meta_title: Option<String>,
    /// SEO meta description
    pub meta_description: Option<String>,
    /// URL once published
    pub published_url: Option<String>,
    /// Publication timestamp
    pub published_at: Option<DateTime<Utc>>,
    /// CMS post id, kept for unpublish/rollback
    pub provider_post_id: Option<u64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
