//! Content topic proposals: the handoff unit between pipelines.

use serde::{Deserialize, Serialize};

/// A keyword plus a proposed content angle, produced by keyword research
/// and consumed by the content generation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Proposed article title
    pub title: String,
    /// Editorial angle distinguishing the piece
    pub angle: String,
    /// Keyword the piece should target
    pub keyword: String,
    /// Estimated monthly search volume
    #[serde(default)]
    pub estimated_volume: u64,
}
