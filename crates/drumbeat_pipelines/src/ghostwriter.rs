//! Content generation pipeline.
//!
//! Linear stage machine with one bounded retry cycle for compliance
//! remediation. Any stage error is fatal to the run; an unresolved
//! compliance block is not an error and instead elevates the review item
//! to critical severity.

use crate::seo::{SeoInput, score_seo, word_count};
use chrono::Utc;
use drumbeat_compliance::ComplianceEngine;
use drumbeat_core::{
    AccountProfile, ComplianceReport, ComplianceStatus, CompletionRequest, ContentPiece,
    ContentStatus, PipelineName, QueueAction, QueueSeverity, QueueStatus, ReviewQueueItem, Run,
    Topic, extraction::extract_json,
};
use drumbeat_error::{DrumbeatResult, PipelineError, PipelineErrorKind};
use drumbeat_interface::{CompletionDriver, ContentStore, ReviewQueueStore, RunStore};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Rewrite attempts allowed before a blocked draft proceeds to queueing.
const MAX_COMPLIANCE_RETRIES: u8 = 2;

/// Stages of the content generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum GhostwriterStage {
    /// Ask the completion service for a structured brief
    GenerateBrief,
    /// Draft full HTML content honoring the brief
    WriteContent,
    /// Deterministic SEO point allocation
    ScoreSeo,
    /// Delegate to the compliance engine
    CheckCompliance,
    /// Disclaimer injection or targeted rewrite
    HandleCompliance,
    /// Persist the piece and its review item
    QueueForReview,
}

/// Structured brief returned by the completion service.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBrief {
    /// Proposed article title
    pub title: String,
    /// Section headings in order
    #[serde(default)]
    pub headings: Vec<String>,
    /// Target word count
    #[serde(default)]
    pub target_word_count: u32,
    /// Internal-link suggestions
    #[serde(default)]
    pub internal_links: Vec<String>,
    /// Differentiation angles
    #[serde(default)]
    pub angles: Vec<String>,
    /// Practice-specific hooks
    #[serde(default)]
    pub hooks: Vec<String>,
}

/// Draft returned by the completion service.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftContent {
    /// Rendered HTML body
    pub html: String,
    /// Markdown mirror of the body
    pub markdown: String,
    /// SEO meta title
    #[serde(default)]
    pub meta_title: Option<String>,
    /// SEO meta description
    #[serde(default)]
    pub meta_description: Option<String>,
}

/// Mutable state threaded through the interpreter loop.
#[derive(Default)]
pub struct GhostwriterState {
    /// Structured brief, once generated
    pub brief: Option<ContentBrief>,
    /// Current draft, rewritten in place by remediation
    pub draft: Option<DraftContent>,
    /// Deterministic SEO score, once computed
    pub seo_score: Option<u8>,
    /// Latest compliance report; cleared to route back to re-checking
    pub report: Option<ComplianceReport>,
    /// Whether the latest report has been acted on
    pub compliance_handled: bool,
    /// Rewrite attempts consumed so far
    pub compliance_retries: u8,
    /// Terminal summary; present once the run is queued
    pub outcome: Option<GhostwriterOutcome>,
}

/// Pure routing function: which stage runs next, given the state.
pub fn next_stage(state: &GhostwriterState) -> Option<GhostwriterStage> {
    if state.outcome.is_some() {
        return None;
    }
    if state.brief.is_none() {
        return Some(GhostwriterStage::GenerateBrief);
    }
    if state.draft.is_none() {
        return Some(GhostwriterStage::WriteContent);
    }
    if state.seo_score.is_none() {
        return Some(GhostwriterStage::ScoreSeo);
    }
    if state.report.is_none() {
        return Some(GhostwriterStage::CheckCompliance);
    }
    if !state.compliance_handled {
        return Some(GhostwriterStage::HandleCompliance);
    }
    Some(GhostwriterStage::QueueForReview)
}

/// Result summary of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostwriterOutcome {
    /// Run record id
    pub run_id: Uuid,
    /// Persisted content piece
    pub content_id: Uuid,
    /// Review queue item awaiting a human
    pub queue_item_id: Uuid,
    /// Deterministic SEO score
    pub seo_score: u8,
    /// Final compliance verdict at queueing time
    pub compliance_status: ComplianceStatus,
    /// Rewrite attempts consumed
    pub compliance_retries: u8,
}

/// The content generation pipeline.
pub struct Ghostwriter {
    driver: Arc<dyn CompletionDriver>,
    compliance: Arc<ComplianceEngine>,
    runs: Arc<dyn RunStore>,
    content: Arc<dyn ContentStore>,
    queue: Arc<dyn ReviewQueueStore>,
}

impl Ghostwriter {
    /// Wire a pipeline from its collaborators.
    pub fn new(
        driver: Arc<dyn CompletionDriver>,
        compliance: Arc<ComplianceEngine>,
        runs: Arc<dyn RunStore>,
        content: Arc<dyn ContentStore>,
        queue: Arc<dyn ReviewQueueStore>,
    ) -> Self {
        Self {
            driver,
            compliance,
            runs,
            content,
            queue,
        }
    }

    /// Draft, score, screen, and queue one piece of content for a topic.
    ///
    /// # Errors
    ///
    /// Validation failures are rejected before any stage runs. A stage
    /// error terminates the run immediately and is recorded verbatim on
    /// the run record.
    #[instrument(skip(self, account, topic), fields(account_id = %account.id, keyword = %topic.keyword))]
    pub async fn run(
        &self,
        account: &AccountProfile,
        topic: &Topic,
        trigger: &str,
    ) -> DrumbeatResult<GhostwriterOutcome> {
        if topic.keyword.trim().is_empty() {
            return Err(PipelineError::new(PipelineErrorKind::Validation(
                "topic keyword is empty".to_string(),
            ))
            .into());
        }
        if topic.title.trim().is_empty() {
            return Err(PipelineError::new(PipelineErrorKind::Validation(
                "topic title is empty".to_string(),
            ))
            .into());
        }

        let mut run = Run::start(account.id, PipelineName::Ghostwriter, trigger);
        run.config = json!({ "topic": topic });
        let run_id = run.id;
        self.runs.create(run).await?;

        let mut state = GhostwriterState::default();
        while let Some(stage) = next_stage(&state) {
            debug!(%stage, "Entering stage");
            if let Err(e) = self.execute(stage, account, topic, run_id, &mut state).await {
                let message = e.to_string();
                if let Err(store_err) = self.runs.fail(run_id, &message).await {
                    warn!(error = %store_err, "Failed to record run failure");
                }
                return Err(e);
            }
        }

        state.outcome.ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::StageFailed {
                stage: GhostwriterStage::QueueForReview.to_string(),
                message: "pipeline ended without an outcome".to_string(),
            })
            .into()
        })
    }

    async fn execute(
        &self,
        stage: GhostwriterStage,
        account: &AccountProfile,
        topic: &Topic,
        run_id: Uuid,
        state: &mut GhostwriterState,
    ) -> DrumbeatResult<()> {
        match stage {
            GhostwriterStage::GenerateBrief => self.generate_brief(account, topic, state).await,
            GhostwriterStage::WriteContent => self.write_content(account, topic, state).await,
            GhostwriterStage::ScoreSeo => self.score_seo(topic, state),
            GhostwriterStage::CheckCompliance => self.check_compliance(account, state).await,
            GhostwriterStage::HandleCompliance => self.handle_compliance(state).await,
            GhostwriterStage::QueueForReview => {
                self.queue_for_review(account, topic, run_id, state).await
            }
        }
    }

    async fn generate_brief(
        &self,
        account: &AccountProfile,
        topic: &Topic,
        state: &mut GhostwriterState,
    ) -> DrumbeatResult<()> {
        let system = "You are a content strategist for local healthcare practices. \
            Respond with a single JSON object: {\"title\", \"headings\": [], \
            \"target_word_count\", \"internal_links\": [], \"angles\": [], \"hooks\": []}.";
        let user = format!(
            "Practice: {name} ({vertical}, {city}). Services: {services}.\n\
             Topic: {title}\nAngle: {angle}\nTarget keyword: {keyword}",
            name = account.name,
            vertical = account.vertical,
            city = account.city,
            services = account.services.join(", "),
            title = topic.title,
            angle = topic.angle,
            keyword = topic.keyword,
        );
        let response = self
            .driver
            .complete(&CompletionRequest::from_prompt(system, user))
            .await?;
        state.brief = Some(parse_stage_json(
            &response.text,
            GhostwriterStage::GenerateBrief,
        )?);
        Ok(())
    }

    async fn write_content(
        &self,
        account: &AccountProfile,
        topic: &Topic,
        state: &mut GhostwriterState,
    ) -> DrumbeatResult<()> {
        let brief = state.brief.as_ref().ok_or_else(|| missing_state("brief"))?;
        let system = "You write patient-facing articles for local healthcare practices. \
            Warm, plain-spoken tone at an eighth-grade reading level. Never use \
            diagnostic language or give medical advice. Respond with a single JSON \
            object: {\"html\", \"markdown\", \"meta_title\", \"meta_description\"}.";
        let user = format!(
            "Practice: {name} in {city}.\nTarget keyword: {keyword}\n\
             Brief: {brief}\nWrite the full article.",
            name = account.name,
            city = account.city,
            keyword = topic.keyword,
            brief = serde_json::to_string(&json!({
                "title": brief.title,
                "headings": brief.headings,
                "target_word_count": brief.target_word_count,
                "internal_links": brief.internal_links,
                "angles": brief.angles,
                "hooks": brief.hooks,
            }))
            .unwrap_or_default(),
        );
        let response = self
            .driver
            .complete(&CompletionRequest::from_prompt(system, user))
            .await?;
        let draft: DraftContent =
            parse_stage_json(&response.text, GhostwriterStage::WriteContent)?;
        debug!(words = word_count(&draft.html), "Draft received");
        state.draft = Some(draft);
        Ok(())
    }

    fn score_seo(&self, topic: &Topic, state: &mut GhostwriterState) -> DrumbeatResult<()> {
        let brief = state.brief.as_ref().ok_or_else(|| missing_state("brief"))?;
        let draft = state.draft.as_ref().ok_or_else(|| missing_state("draft"))?;
        let score = score_seo(&SeoInput {
            title: &brief.title,
            body_html: &draft.html,
            keyword: &topic.keyword,
            meta_title: draft.meta_title.as_deref(),
            meta_description: draft.meta_description.as_deref(),
        });
        info!(score, "SEO scored");
        state.seo_score = Some(score);
        Ok(())
    }

    async fn check_compliance(
        &self,
        account: &AccountProfile,
        state: &mut GhostwriterState,
    ) -> DrumbeatResult<()> {
        let draft = state.draft.as_ref().ok_or_else(|| missing_state("draft"))?;
        let report = self.compliance.check(&draft.html, &account.vertical).await;
        state.report = Some(report);
        state.compliance_handled = false;
        Ok(())
    }

    async fn handle_compliance(&self, state: &mut GhostwriterState) -> DrumbeatResult<()> {
        let report = state.report.as_ref().ok_or_else(|| missing_state("report"))?;
        match report.status {
            ComplianceStatus::Pass => {
                state.compliance_handled = true;
            }
            ComplianceStatus::Warn => {
                let disclaimers: Vec<String> = report
                    .details
                    .iter()
                    .filter_map(|d| d.disclaimer.clone())
                    .collect();
                let draft = state.draft.as_mut().ok_or_else(|| missing_state("draft"))?;
                for disclaimer in disclaimers {
                    draft.html.push_str(&format!(
                        "\n<p class=\"disclaimer\"><em>{disclaimer}</em></p>"
                    ));
                }
                state.compliance_handled = true;
            }
            ComplianceStatus::Block => {
                if state.compliance_retries < MAX_COMPLIANCE_RETRIES {
                    let revised = self.rewrite_flagged(state).await?;
                    let draft = state.draft.as_mut().ok_or_else(|| missing_state("draft"))?;
                    draft.html = revised;
                    state.compliance_retries += 1;
                    // Clearing the report routes back to check_compliance.
                    state.report = None;
                    info!(
                        attempt = state.compliance_retries,
                        "Rewrote flagged passages, re-checking"
                    );
                } else {
                    warn!("Rewrite budget exhausted, queueing blocked draft for human review");
                    state.compliance_handled = true;
                }
            }
        }
        Ok(())
    }

    async fn rewrite_flagged(&self, state: &GhostwriterState) -> DrumbeatResult<String> {
        let report = state.report.as_ref().ok_or_else(|| missing_state("report"))?;
        let draft = state.draft.as_ref().ok_or_else(|| missing_state("draft"))?;

        let mut findings = String::new();
        for detail in &report.details {
            findings.push_str(&format!(
                "- phrase: \"{}\"\n  reason: {}\n  suggested fix: {}\n",
                detail.phrase,
                detail.reason,
                detail.suggestion.as_deref().unwrap_or("rephrase compliantly"),
            ));
        }

        let system = "You revise healthcare marketing copy for regulatory compliance. \
            Rewrite ONLY the flagged passages; leave everything else byte-for-byte \
            unchanged. Respond with the complete revised HTML and nothing else.";
        let user = format!(
            "Flagged passages:\n{findings}\nCurrent HTML:\n{html}",
            html = draft.html
        );
        let response = self
            .driver
            .complete(&CompletionRequest::from_prompt(system, user))
            .await?;
        Ok(strip_code_fence(&response.text))
    }

    async fn queue_for_review(
        &self,
        account: &AccountProfile,
        topic: &Topic,
        run_id: Uuid,
        state: &mut GhostwriterState,
    ) -> DrumbeatResult<()> {
        let brief = state.brief.as_ref().ok_or_else(|| missing_state("brief"))?;
        let draft = state.draft.as_ref().ok_or_else(|| missing_state("draft"))?;
        let report = state.report.as_ref().ok_or_else(|| missing_state("report"))?;
        let seo_score = state.seo_score.ok_or_else(|| missing_state("seo score"))?;

        let mut piece = ContentPiece {
            id: Uuid::new_v4(),
            account_id: account.id,
            title: brief.title.clone(),
            body_html: draft.html.clone(),
            body_markdown: draft.markdown.clone(),
            content_type: "blog_post".to_string(),
            status: ContentStatus::InReview,
            target_keyword: topic.keyword.clone(),
            related_keywords: Vec::new(),
            seo_score,
            compliance_status: report.status,
            compliance_details: report.details.clone(),
            meta_title: draft.meta_title.clone(),
            meta_description: draft.meta_description.clone(),
            published_url: None,
            published_at: None,
            provider_post_id: None,
            created_at: Utc::now(),
        };
        self.content.insert(piece.clone()).await?;

        let severity = if report.status == ComplianceStatus::Block {
            QueueSeverity::Critical
        } else {
            QueueSeverity::Info
        };
        let item = ReviewQueueItem {
            id: Uuid::new_v4(),
            account_id: account.id,
            content_id: Some(piece.id),
            action: QueueAction::ContentReview,
            proposed: json!({
                "title": piece.title,
                "target_keyword": piece.target_keyword,
                "seo_score": seo_score,
                "compliance_status": report.status,
                "compliance_details": report.details,
            }),
            rollback: None,
            severity,
            status: QueueStatus::Pending,
            approver: None,
            decided_at: None,
            deployed_at: None,
            created_at: Utc::now(),
        };
        if let Err(e) = self.queue.insert(item.clone()).await {
            // The piece would otherwise sit in review with no reviewer
            // ever seeing it; mark it rejected before surfacing the error.
            piece.status = ContentStatus::Rejected;
            if let Err(cleanup) = self.content.update(piece).await {
                warn!(error = %cleanup, "Compensating content cleanup failed");
            }
            return Err(e);
        }

        self.runs
            .complete(
                run_id,
                json!({
                    "content_id": piece.id,
                    "queue_item_id": item.id,
                    "seo_score": seo_score,
                    "compliance_status": report.status,
                    "compliance_retries": state.compliance_retries,
                }),
            )
            .await?;

        state.outcome = Some(GhostwriterOutcome {
            run_id,
            content_id: piece.id,
            queue_item_id: item.id,
            seo_score,
            compliance_status: report.status,
            compliance_retries: state.compliance_retries,
        });
        Ok(())
    }
}

fn parse_stage_json<T: serde::de::DeserializeOwned>(
    response: &str,
    stage: GhostwriterStage,
) -> DrumbeatResult<T> {
    let payload = extract_json(response).ok_or_else(|| {
        PipelineError::new(PipelineErrorKind::StageFailed {
            stage: stage.to_string(),
            message: "completion contained no JSON payload".to_string(),
        })
    })?;
    serde_json::from_str(&payload).map_err(|e| {
        PipelineError::new(PipelineErrorKind::StageFailed {
            stage: stage.to_string(),
            message: format!("completion JSON did not match the expected shape: {e}"),
        })
        .into()
    })
}

fn missing_state(what: &str) -> drumbeat_error::DrumbeatError {
    PipelineError::new(PipelineErrorKind::StageFailed {
        stage: "routing".to_string(),
        message: format!("stage entered without {what}"),
    })
    .into()
}

/// Drop a wrapping markdown code fence, if the model added one.
fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or(rest);
        if let Some(inner) = body.rsplit_once("```") {
            return inner.0.trim().to_string();
        }
    }
    trimmed.to_string()
}
