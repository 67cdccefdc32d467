//! Tracked keywords and keyword-research result shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of a tracked keyword.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KeywordKind {
    /// Directly targeted by the account's content plan
    Target,
    /// Competitor ranks for it, the account does not
    Gap,
    /// Contains the account's brand name
    Branded,
    /// Tracked for position only
    Tracked,
}

/// One tracked search term for an account.
///
/// Upserted by the unique `(account, lowercased text)` pair; positions are
/// updated by later pipeline runs, never by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    /// Unique keyword id
    pub id: Uuid,
    /// Owning account
    pub account_id: Uuid,
    /// The search term
    pub text: String,
    /// Current rank position, when known
    pub position: Option<u32>,
    /// Position at the previous check
    pub previous_position: Option<u32>,
    /// Best position ever observed
    pub best_position: Option<u32>,
    /// Monthly search volume
    pub search_volume: Option<u64>,
    /// Difficulty score, 0-100
    pub difficulty: Option<u8>,
    /// Classification
    pub kind: KeywordKind,
    /// Where the keyword came from (e.g. "research", "gap_analysis")
    pub source: String,
    /// When positions were last refreshed
    pub last_checked_at: Option<DateTime<Utc>>,
}

/// Bulk-research result row from the keyword-research API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMetrics {
    /// The search term
    pub keyword: String,
    /// Monthly search volume
    #[serde(default)]
    pub search_volume: u64,
    /// Difficulty score, 0-100
    #[serde(default)]
    pub difficulty: u8,
    /// Cost per click, USD
    #[serde(default)]
    pub cpc: f64,
    /// Paid competition index, 0.0-1.0
    #[serde(default)]
    pub competition: f64,
}

/// Rank-tracking position row from the keyword-research API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordPosition {
    /// The search term
    pub keyword: String,
    /// Current position, absent when not ranking
    pub position: Option<u32>,
    /// Position at the previous check
    pub previous_position: Option<u32>,
    /// Ranking URL
    pub url: Option<String>,
    /// Monthly search volume
    #[serde(default)]
    pub search_volume: u64,
}

/// One row of search-performance data (query plus aggregate metrics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPerformanceRow {
    /// The search query
    pub query: String,
    /// Clicks over the window
    pub clicks: u64,
    /// Impressions over the window
    pub impressions: u64,
    /// Click-through rate, 0.0-1.0
    pub ctr: f64,
    /// Average position over the window
    pub position: f64,
}
