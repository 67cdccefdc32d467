//! Run records for pipeline and conductor invocations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Which pipeline a run record belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineName {
    /// Keyword research pipeline
    Scholar,
    /// Content generation pipeline
    Ghostwriter,
    /// Campaign orchestration cycle
    Conductor,
}

/// Lifecycle status of a run.
///
/// Status is monotonic: once `Completed` or `Failed`, a run is terminal and
/// is never rewritten. The run store enforces this.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    /// The run is in progress
    Running,
    /// The run reached its end state successfully
    Completed,
    /// A stage error terminated the run
    Failed,
}

impl RunStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// One execution record of a pipeline or conductor cycle.
///
/// Created when a pipeline begins; mutated only by that pipeline to append
/// partial results and, exactly once, to set a terminal status.
///
/// # Examples
///
/// ```
/// use drumbeat_core::{PipelineName, Run};
/// use uuid::Uuid;
///
/// let run = Run::start(Uuid::new_v4(), PipelineName::Scholar, "manual");
/// assert!(!run.status.is_terminal());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Unique run id
    pub id: Uuid,
    /// Owning account
    pub account_id: Uuid,
    /// Pipeline that produced this run
    pub pipeline: PipelineName,
    /// Current lifecycle status
    pub status: RunStatus,
    /// Why the run was started (e.g. "manual", "weekly")
    pub trigger: String,
    /// Input configuration captured at start
    pub config: JsonValue,
    /// Result payload, appended by the owning pipeline
    pub result: Option<JsonValue>,
    /// Error text when the run failed
    pub error: Option<String>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run reached a terminal status
    pub completed_at: Option<DateTime<Utc>>,
}

impl Run {
    /// Create a fresh `Running` record for a pipeline invocation.
    pub fn start(account_id: Uuid, pipeline: PipelineName, trigger: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            pipeline,
            status: RunStatus::Running,
            trigger: trigger.into(),
            config: JsonValue::Null,
            result: None,
            error: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }
}
