//! Review queue items: units of proposed automated work awaiting approval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// What kind of work a queue item proposes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueueAction {
    /// A drafted content piece awaiting editorial review
    ContentReview,
    /// A proposed content topic from keyword research
    ContentRecommendation,
}

impl QueueAction {
    /// Whether approval of this action publishes content to the CMS.
    pub fn is_content_action(&self) -> bool {
        matches!(self, QueueAction::ContentReview)
    }
}

/// Reviewer-facing severity of a queue item.
///
///// Independent of the compliance `pass|warn|block` verdict: a blocked draft
/// surfaces as a `Critical` queue item rather than a failed run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueueSeverity {
    /// Needs prompt human attention
    Critical,
    /// Worth a closer look
    Warning,
    /// Routine review
    Info,
}

/// Queue item lifecycle.
///
/// `Pending → Approved | Rejected`, `Approved → Deployed`,
/// `Deployed → RolledBack`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueueStatus {
    /// Awaiting a reviewer decision
    Pending,
    /// Approved; deployment may follow for content actions
    Approved,
    /// Declined by a reviewer
    Rejected,
    /// Approved and live
    Deployed,
    /// Deployment reverted
    RolledBack,
}

/// One unit of human-reviewable work, optionally tied to a content piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewQueueItem {
    /// Unique queue item id
    pub id: Uuid,
    /// Owning account
    pub account_id: Uuid,
    /// Referenced content piece, when the action concerns one
    pub content_id: Option<Uuid>,
    /// Proposed action type
    pub action: QueueAction,
    /// Proposed payload shown to the reviewer
    pub proposed: JsonValue,
    /// Data needed to revert a deployment (e.g. provider post id)
    pub rollback: Option<JsonValue>,
    /// Reviewer-facing severity
    pub severity: QueueSeverity,
    /// Lifecycle status
    pub status: QueueStatus,
    /// Reviewer who approved or rejected the item
    pub approver: Option<String>,
    /// When the decision was made
    pub decided_at: Option<DateTime<Utc>>,
    /// When the approved action was deployed
    pub deployed_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
