//! Campaign conductor: one research-then-draft cycle per account, plus
//! the weekly fan-out over every managed account.

use crate::{Ghostwriter, Scholar, ScholarOutcome};
use drumbeat_core::{AccountHealth, AccountProfile, PipelineName, Run};
use drumbeat_error::{DrumbeatResult, PipelineError, PipelineErrorKind};
use drumbeat_interface::{AccountStore, RunStore};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Topics handed to the content pipeline per cycle.
const TOPICS_PER_CYCLE: usize = 2;

/// Stages of a conductor cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConductorStage {
    /// Gate on the account's connectivity flag
    CheckHealth,
    /// Run the keyword research pipeline
    RunScholar,
    /// Run the content pipeline once per selected topic
    RunGhostwriter,
    /// Record the cycle summary
    Finalize,
}

/// Mutable state threaded through the interpreter loop.
#[derive(Default)]
pub struct ConductorState {
    /// Health-gate verdict, once checked
    pub healthy: Option<bool>,
    /// Keyword pipeline outcome, once run
    pub scholar: Option<ScholarOutcome>,
    /// Content pieces generated, once the ghostwriter pass ran
    pub content_ids: Option<Vec<Uuid>>,
    /// Per-topic errors captured without aborting remaining topics
    pub topic_errors: Vec<String>,
    /// Terminal summary
    pub outcome: Option<CycleOutcome>,
}

/// Pure routing function: which stage runs next, given the state.
pub fn next_stage(state: &ConductorState) -> Option<ConductorStage> {
    if state.outcome.is_some() {
        return None;
    }
    match state.healthy {
        None => Some(ConductorStage::CheckHealth),
        Some(false) => Some(ConductorStage::Finalize),
        Some(true) => {
            if state.scholar.is_none() {
                Some(ConductorStage::RunScholar)
            } else if state.content_ids.is_none() {
                Some(ConductorStage::RunGhostwriter)
            } else {
                Some(ConductorStage::Finalize)
            }
        }
    }
}

/// Summary of one conductor cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    /// Conductor run record id
    pub run_id: Uuid,
    /// Whether the health gate short-circuited the cycle
    pub skipped: bool,
    /// Keywords saved by the keyword pipeline
    pub keywords: usize,
    /// Content pieces generated
    pub content_pieces: Vec<Uuid>,
    /// Per-topic content errors
    pub topic_errors: Vec<String>,
}

/// Per-account entry in the weekly fan-out report.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountCycleResult {
    /// The account
    pub account_id: Uuid,
    /// Terminal status of the account's cycle
    pub status: CycleStatus,
    /// Error text when the cycle raised
    pub error: Option<String>,
}

/// Terminal status of one account's weekly cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CycleStatus {
    /// Cycle ran to completion
    Completed,
    /// Account not active; cycle not started
    Skipped,
    /// Cycle raised; remaining accounts unaffected
    Error,
}

/// Weekly fan-out report.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyCycleReport {
    /// Cycles actually started
    pub triggered: usize,
    /// One entry per managed account
    pub results: Vec<AccountCycleResult>,
}

/// Orchestrates research-then-draft cycles across accounts.
pub struct Conductor {
    scholar: Arc<Scholar>,
    ghostwriter: Arc<Ghostwriter>,
    accounts: Arc<dyn AccountStore>,
    runs: Arc<dyn RunStore>,
}

impl Conductor {
    /// Wire a conductor from its collaborators.
    pub fn new(
        scholar: Arc<Scholar>,
        ghostwriter: Arc<Ghostwriter>,
        accounts: Arc<dyn AccountStore>,
        runs: Arc<dyn RunStore>,
    ) -> Self {
        Self {
            scholar,
            ghostwriter,
            accounts,
            runs,
        }
    }

    /// Run one full cycle for an account.
    #[instrument(skip(self))]
    pub async fn run_cycle(&self, account_id: Uuid, trigger: &str) -> DrumbeatResult<CycleOutcome> {
        let account = self.accounts.get(account_id).await?;

        let run = Run::start(account.id, PipelineName::Conductor, trigger);
        let run_id = run.id;
        self.runs.create(run).await?;

        let mut state = ConductorState::default();
        while let Some(stage) = next_stage(&state) {
            debug!(%stage, "Entering stage");
            if let Err(e) = self
                .execute(stage, &account, run_id, trigger, &mut state)
                .await
            {
                let message = e.to_string();
                if let Err(store_err) = self.runs.fail(run_id, &message).await {
                    warn!(error = %store_err, "Failed to record run failure");
                }
                return Err(e);
            }
        }

        state.outcome.ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::StageFailed {
                stage: ConductorStage::Finalize.to_string(),
                message: "cycle ended without an outcome".to_string(),
            })
            .into()
        })
    }

    async fn execute(
        &self,
        stage: ConductorStage,
        account: &AccountProfile,
        run_id: Uuid,
        trigger: &str,
        state: &mut ConductorState,
    ) -> DrumbeatResult<()> {
        match stage {
            ConductorStage::CheckHealth => {
                let healthy = account.health == AccountHealth::Active;
                if !healthy {
                    info!(health = %account.health, "Account not active, skipping cycle");
                }
                state.healthy = Some(healthy);
                Ok(())
            }
            ConductorStage::RunScholar => {
                state.scholar = Some(self.scholar.run(account, trigger).await?);
                Ok(())
            }
            ConductorStage::RunGhostwriter => {
                self.run_ghostwriter(account, trigger, state).await;
                Ok(())
            }
            ConductorStage::Finalize => self.finalize(run_id, state).await,
        }
    }

    /// Top topics drafted sequentially; a failing topic never aborts the
    /// remaining ones.
    async fn run_ghostwriter(
        &self,
        account: &AccountProfile,
        trigger: &str,
        state: &mut ConductorState,
    ) {
        let topics: Vec<_> = state
            .scholar
            .iter()
            .flat_map(|s| s.topics.iter())
            .take(TOPICS_PER_CYCLE)
            .cloned()
            .collect();

        let mut content_ids = Vec::new();
        for topic in &topics {
            match self.ghostwriter.run(account, topic, trigger).await {
                Ok(outcome) => content_ids.push(outcome.content_id),
                Err(e) => {
                    warn!(topic = %topic.title, error = %e, "Topic draft failed, continuing");
                    state.topic_errors.push(format!("{}: {e}", topic.title));
                }
            }
        }
        state.content_ids = Some(content_ids);
    }

    async fn finalize(&self, run_id: Uuid, state: &mut ConductorState) -> DrumbeatResult<()> {
        if state.healthy == Some(false) {
            self.runs
                .complete(run_id, json!({ "skipped": true, "reason": "account not active" }))
                .await?;
            state.outcome = Some(CycleOutcome {
                run_id,
                skipped: true,
                keywords: 0,
                content_pieces: Vec::new(),
                topic_errors: Vec::new(),
            });
            return Ok(());
        }

        let keywords = state.scholar.as_ref().map_or(0, |s| s.keywords_saved);
        let content_pieces = state.content_ids.clone().unwrap_or_default();
        self.runs
            .complete(
                run_id,
                json!({
                    "keywords": keywords,
                    "content_pieces": content_pieces,
                    "topic_errors": state.topic_errors,
                }),
            )
            .await?;
        state.outcome = Some(CycleOutcome {
            run_id,
            skipped: false,
            keywords,
            content_pieces,
            topic_errors: state.topic_errors.clone(),
        });
        Ok(())
    }

    /// Run a cycle for every managed account, sequentially.
    ///
    /// Non-active accounts are skipped without starting a cycle; a failing
    /// account is recorded and never aborts the remaining accounts.
    #[instrument(skip(self))]
    pub async fn run_weekly_cycle(&self) -> DrumbeatResult<WeeklyCycleReport> {
        let accounts = self.accounts.list().await?;
        let mut triggered = 0;
        let mut results = Vec::with_capacity(accounts.len());

        for account in accounts {
            if account.health != AccountHealth::Active {
                results.push(AccountCycleResult {
                    account_id: account.id,
                    status: CycleStatus::Skipped,
                    error: None,
                });
                continue;
            }
            triggered += 1;
            match self.run_cycle(account.id, "weekly").await {
                Ok(_) => results.push(AccountCycleResult {
                    account_id: account.id,
                    status: CycleStatus::Completed,
                    error: None,
                }),
                Err(e) => {
                    warn!(account_id = %account.id, error = %e, "Weekly cycle failed, continuing");
                    results.push(AccountCycleResult {
                        account_id: account.id,
                        status: CycleStatus::Error,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        info!(triggered, total = results.len(), "Weekly fan-out finished");
        Ok(WeeklyCycleReport { triggered, results })
    }
}
