//! Content pipeline behavior: the remediation loop, disclaimer injection,
//! fail-fast stage errors, and entry validation.

use async_trait::async_trait;
use drumbeat_compliance::ComplianceEngine;
use drumbeat_core::{
    AccountHealth, AccountProfile, ComplianceStatus, CompletionRequest, CompletionResponse,
    ContentStatus, QueueSeverity, QueueStatus, RunStatus, Topic,
};
use drumbeat_error::{
    CompletionError, DrumbeatErrorKind, DrumbeatResult, PipelineErrorKind,
};
use drumbeat_interface::{CompletionDriver, ContentStore, ReviewQueueStore, RunStore};
use drumbeat_pipelines::Ghostwriter;
use drumbeat_store::{MemoryContentStore, MemoryQueueStore, MemoryRunStore};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Driver scripted per pipeline stage, keyed off the system prompt.
struct ScriptedDriver {
    draft_html: String,
    rewrite_html: Option<String>,
    rewrite_calls: AtomicUsize,
    fail_on_draft: bool,
}

impl ScriptedDriver {
    fn new(draft_html: impl Into<String>) -> Self {
        Self {
            draft_html: draft_html.into(),
            rewrite_html: None,
            rewrite_calls: AtomicUsize::new(0),
            fail_on_draft: false,
        }
    }

    fn with_rewrite(mut self, html: impl Into<String>) -> Self {
        self.rewrite_html = Some(html.into());
        self
    }
}

#[async_trait]
impl CompletionDriver for ScriptedDriver {
    async fn complete(&self, req: &CompletionRequest) -> DrumbeatResult<CompletionResponse> {
        let system = &req.messages[0].content;
        if system.contains("content strategist") {
            return Ok(CompletionResponse {
                text: json!({
                    "title": "Understanding Dental Implants",
                    "headings": ["What implants are", "What to expect"],
                    "target_word_count": 900
                })
                .to_string(),
            });
        }
        if system.contains("patient-facing") {
            if self.fail_on_draft {
                return Err(CompletionError::new("completion service unavailable").into());
            }
            return Ok(CompletionResponse {
                text: json!({
                    "html": self.draft_html,
                    "markdown": "drafted body",
                    "meta_title": "Understanding Dental Implants for Austin Patients",
                    "meta_description": "A plain-spoken look at dental implants."
                })
                .to_string(),
            });
        }
        if system.contains("revise") {
            self.rewrite_calls.fetch_add(1, Ordering::SeqCst);
            let html = self
                .rewrite_html
                .clone()
                .unwrap_or_else(|| self.draft_html.clone());
            return Ok(CompletionResponse { text: html });
        }
        Err(CompletionError::new("unscripted prompt").into())
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-1"
    }
}

fn account() -> AccountProfile {
    AccountProfile {
        id: Uuid::new_v4(),
        name: "Bright Smile Dental".to_string(),
        vertical: "dental".to_string(),
        city: "Austin".to_string(),
        services: vec!["dental implants".to_string()],
        competitors: vec![],
        health: AccountHealth::Active,
        cms: None,
    }
}

fn topic() -> Topic {
    Topic {
        title: "Understanding Dental Implants".to_string(),
        angle: "what first-time patients should expect".to_string(),
        keyword: "dental implants".to_string(),
        estimated_volume: 720,
    }
}

struct Fixture {
    pipeline: Ghostwriter,
    runs: Arc<MemoryRunStore>,
    content: Arc<MemoryContentStore>,
    queue: Arc<MemoryQueueStore>,
}

fn fixture(driver: ScriptedDriver) -> Fixture {
    let runs = Arc::new(MemoryRunStore::new());
    let content = Arc::new(MemoryContentStore::new());
    let queue = Arc::new(MemoryQueueStore::new());
    let engine = Arc::new(ComplianceEngine::new().expect("standard rules compile"));
    let pipeline = Ghostwriter::new(
        Arc::new(driver),
        engine,
        Arc::clone(&runs) as Arc<dyn RunStore>,
        Arc::clone(&content) as Arc<dyn ContentStore>,
        Arc::clone(&queue) as Arc<dyn ReviewQueueStore>,
    );
    Fixture {
        pipeline,
        runs,
        content,
        queue,
    }
}

#[tokio::test]
async fn clean_draft_completes_with_an_info_review_item() {
    let fx = fixture(ScriptedDriver::new(
        "<p>Implants replace missing teeth and many patients do well with them.</p>",
    ));
    let outcome = fx
        .pipeline
        .run(&account(), &topic(), "manual")
        .await
        .expect("run completes");

    assert_eq!(outcome.compliance_status, ComplianceStatus::Pass);
    assert_eq!(outcome.compliance_retries, 0);

    let piece = fx.content.get(outcome.content_id).await.expect("piece");
    assert_eq!(piece.status, ContentStatus::InReview);
    assert_eq!(piece.target_keyword, "dental implants");

    let item = fx.queue.get(outcome.queue_item_id).await.expect("item");
    assert_eq!(item.severity, QueueSeverity::Info);
    assert_eq!(item.status, QueueStatus::Pending);
    assert_eq!(item.content_id, Some(outcome.content_id));

    let run = fx.runs.get(outcome.run_id).await.expect("run");
    assert_eq!(run.status, RunStatus::Completed);
    let result = run.result.expect("result summary");
    assert_eq!(result["seo_score"], json!(outcome.seo_score));
    assert_eq!(result["compliance_retries"], json!(0));
}

#[tokio::test]
async fn persistent_block_stops_after_two_rewrites_and_queues_critical() {
    // The rewrite returns the same blocked copy, so every re-check blocks.
    let blocked = "<p>This treatment is guaranteed to work for everyone.</p>";
    let fx = fixture(ScriptedDriver::new(blocked).with_rewrite(blocked));
    let outcome = fx
        .pipeline
        .run(&account(), &topic(), "manual")
        .await
        .expect("a blocked draft still completes");

    assert_eq!(outcome.compliance_retries, 2);
    assert_eq!(outcome.compliance_status, ComplianceStatus::Block);

    let item = fx.queue.get(outcome.queue_item_id).await.expect("item");
    assert_eq!(item.severity, QueueSeverity::Critical);

    let run = fx.runs.get(outcome.run_id).await.expect("run");
    assert_eq!(run.status, RunStatus::Completed);
}

#[tokio::test]
async fn successful_rewrite_clears_the_block() {
    let blocked = "<p>This treatment is guaranteed to work for everyone.</p>";
    let clean = "<p>Most patients see strong results, though outcomes vary.</p>";
    let fx = fixture(ScriptedDriver::new(blocked).with_rewrite(clean));

    let outcome = fx
        .pipeline
        .run(&account(), &topic(), "manual")
        .await
        .expect("run completes");

    assert_eq!(outcome.compliance_retries, 1);
    assert_eq!(outcome.compliance_status, ComplianceStatus::Pass);
    let item = fx.queue.get(outcome.queue_item_id).await.expect("item");
    assert_eq!(item.severity, QueueSeverity::Info);

    let piece = fx.content.get(outcome.content_id).await.expect("piece");
    assert_eq!(piece.body_html, clean);
}

#[tokio::test]
async fn warn_findings_append_their_disclaimers() {
    let fx = fixture(ScriptedDriver::new(
        "<p>Implants are often covered by most insurance plans.</p>",
    ));
    let outcome = fx
        .pipeline
        .run(&account(), &topic(), "manual")
        .await
        .expect("run completes");

    assert_eq!(outcome.compliance_status, ComplianceStatus::Warn);
    assert_eq!(outcome.compliance_retries, 0);

    let piece = fx.content.get(outcome.content_id).await.expect("piece");
    assert!(
        piece.body_html.contains("Insurance coverage varies by plan"),
        "disclaimer must be appended as a visible paragraph"
    );

    let item = fx.queue.get(outcome.queue_item_id).await.expect("item");
    assert_eq!(item.severity, QueueSeverity::Info);
}

#[tokio::test]
async fn stage_error_fails_fast() {
    let mut driver = ScriptedDriver::new("<p>never reached</p>");
    driver.fail_on_draft = true;
    let fx = fixture(driver);

    let err = fx
        .pipeline
        .run(&account(), &topic(), "manual")
        .await
        .expect_err("draft stage error is fatal");
    assert!(err.to_string().contains("completion service unavailable"));
}

#[tokio::test]
async fn empty_topic_keyword_is_rejected_before_any_stage() {
    let fx = fixture(ScriptedDriver::new("<p>unused</p>"));
    let mut bad_topic = topic();
    bad_topic.keyword = "  ".to_string();

    let err = fx
        .pipeline
        .run(&account(), &bad_topic, "manual")
        .await
        .expect_err("validation rejects the topic");
    assert!(matches!(
        err.kind(),
        DrumbeatErrorKind::Pipeline(p)
            if matches!(p.kind, PipelineErrorKind::Validation(_))
    ));
}
