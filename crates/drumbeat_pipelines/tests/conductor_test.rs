//! Conductor behavior: the health gate, topic fan-out limits, per-topic
//! fault isolation, and the weekly fan-out over all accounts.

use async_trait::async_trait;
use drumbeat_compliance::ComplianceEngine;
use drumbeat_core::{
    AccountHealth, AccountProfile, CompletionRequest, CompletionResponse, KeywordMetrics,
    RunStatus, SearchPerformanceRow,
};
use drumbeat_error::{CompletionError, DrumbeatResult};
use drumbeat_interface::{
    AccountStore, CompletionDriver, ContentStore, KeywordResearch, KeywordStore, ReviewQueueStore,
    RunStore, SearchPerformanceSource,
};
use drumbeat_pipelines::{Conductor, CycleStatus, Ghostwriter, Scholar};
use drumbeat_store::{
    MemoryAccountStore, MemoryContentStore, MemoryKeywordStore, MemoryQueueStore, MemoryRunStore,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Serves every prompt in a cycle: prioritization, briefs, and drafts.
struct StackDriver {
    scholar_reply: String,
}

#[async_trait]
impl CompletionDriver for StackDriver {
    async fn complete(&self, req: &CompletionRequest) -> DrumbeatResult<CompletionResponse> {
        let system = &req.messages[0].content;
        if system.contains("SEO strategist") {
            return Ok(CompletionResponse {
                text: self.scholar_reply.clone(),
            });
        }
        if system.contains("content strategist") {
            return Ok(CompletionResponse {
                text: json!({
                    "title": "A Patient's Guide",
                    "headings": ["Overview"],
                    "target_word_count": 800
                })
                .to_string(),
            });
        }
        if system.contains("patient-facing") {
            return Ok(CompletionResponse {
                text: json!({
                    "html": "<p>Implants replace missing teeth and many patients do well with them.</p>",
                    "markdown": "drafted body",
                    "meta_title": "A Patient's Guide",
                    "meta_description": "Plain-spoken answers."
                })
                .to_string(),
            });
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

struct FakeResearch;

#[async_trait]
impl KeywordResearch for FakeResearch {
    async fn bulk_research(&self, _seeds: &[String]) -> DrumbeatResult<Vec<KeywordMetrics>> {
        Ok(vec![KeywordMetrics {
            keyword: "dental implants austin".to_string(),
            search_volume: 900,
            difficulty: 40,
            cpc: 1.5,
            competition: 0.4,
        }])
    }

    async fn competitor_keywords(&self, _domain: &str) -> DrumbeatResult<Vec<KeywordMetrics>> {
        Ok(vec![])
    }
}

/// Errors for one account id, succeeds (empty) for all others.
struct FakePerformance {
    failing: Option<Uuid>,
}

#[async_trait]
impl SearchPerformanceSource for FakePerformance {
    async fn search_performance(
        &self,
        account_id: Uuid,
        _days: u32,
        _limit: usize,
    ) -> DrumbeatResult<Vec<SearchPerformanceRow>> {
        if self.failing == Some(account_id) {
            return Err(CompletionError::new("search console unavailable").into());
        }
        Ok(vec![])
    }
}

fn account(health: AccountHealth) -> AccountProfile {
    AccountProfile {
        id: Uuid::new_v4(),
        name: "Bright Smile Dental".to_string(),
        vertical: "dental".to_string(),
        city: "Austin".to_string(),
        services: vec!["dental implants".to_string()],
        competitors: vec![],
        health,
        cms: None,
    }
}

fn topic_json(title: &str, keyword: &str) -> serde_json::Value {
    json!({
        "title": title,
        "angle": "what to expect",
        "keyword": keyword,
        "estimated_volume": 500,
    })
}

struct Fixture {
    conductor: Conductor,
    accounts: Arc<MemoryAccountStore>,
    runs: Arc<MemoryRunStore>,
}

fn fixture(scholar_reply: serde_json::Value, failing_performance: Option<Uuid>) -> Fixture {
    let driver: Arc<dyn CompletionDriver> = Arc::new(StackDriver {
        scholar_reply: scholar_reply.to_string(),
    });
    let runs = Arc::new(MemoryRunStore::new());
    let accounts = Arc::new(MemoryAccountStore::new());
    let keywords = Arc::new(MemoryKeywordStore::new());
    let content = Arc::new(MemoryContentStore::new());
    let queue = Arc::new(MemoryQueueStore::new());
    let engine = Arc::new(ComplianceEngine::new().expect("standard rules compile"));

    let scholar = Arc::new(Scholar::new(
        Arc::clone(&driver),
        Arc::new(FakeResearch),
        Arc::new(FakePerformance {
            failing: failing_performance,
        }),
        Arc::clone(&runs) as Arc<dyn RunStore>,
        keywords as Arc<dyn KeywordStore>,
        Arc::clone(&queue) as Arc<dyn ReviewQueueStore>,
    ));
    let ghostwriter = Arc::new(Ghostwriter::new(
        driver,
        engine,
        Arc::clone(&runs) as Arc<dyn RunStore>,
        content as Arc<dyn ContentStore>,
        queue as Arc<dyn ReviewQueueStore>,
    ));
    let conductor = Conductor::new(
        scholar,
        ghostwriter,
        Arc::clone(&accounts) as Arc<dyn AccountStore>,
        Arc::clone(&runs) as Arc<dyn RunStore>,
    );
    Fixture {
        conductor,
        accounts,
        runs,
    }
}

fn three_topic_reply() -> serde_json::Value {
    json!({
        "keywords": [
            {"keyword": "dental implants austin", "reasoning": "high intent", "kind": "target"},
        ],
        "topics": [
            topic_json("Implant Basics", "dental implants"),
            topic_json("Implant Costs", "dental implant cost"),
            topic_json("Implant Recovery", "dental implant recovery"),
        ],
    })
}

#[tokio::test]
async fn inactive_account_is_skipped_with_a_completed_run() {
    let fx = fixture(three_topic_reply(), None);
    let account_id = fx.accounts.seed(account(AccountHealth::Disconnected)).await;

    let outcome = fx
        .conductor
        .run_cycle(account_id, "manual")
        .await
        .expect("skipping is not an error");

    assert!(outcome.skipped);
    assert_eq!(outcome.keywords, 0);
    assert!(outcome.content_pieces.is_empty());

    let run = fx.runs.get(outcome.run_id).await.expect("run");
    assert_eq!(run.status, RunStatus::Completed);
    let result = run.result.expect("result");
    assert_eq!(result["skipped"], json!(true));
    assert_eq!(result["reason"], json!("account not active"));
}

#[tokio::test]
async fn cycle_drafts_only_the_top_two_topics() {
    let fx = fixture(three_topic_reply(), None);
    let account_id = fx.accounts.seed(account(AccountHealth::Active)).await;

    let outcome = fx
        .conductor
        .run_cycle(account_id, "manual")
        .await
        .expect("cycle completes");

    assert!(!outcome.skipped);
    assert_eq!(outcome.keywords, 1);
    assert_eq!(outcome.content_pieces.len(), 2);
    assert!(outcome.topic_errors.is_empty());

    let run = fx.runs.get(outcome.run_id).await.expect("run");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(
        run.result.expect("result")["content_pieces"]
            .as_array()
            .map(Vec::len),
        Some(2)
    );
}

#[tokio::test]
async fn failing_topic_is_recorded_and_the_rest_still_draft() {
    // The first topic's empty keyword is rejected by content validation.
    let reply = json!({
        "keywords": [
            {"keyword": "dental implants austin", "reasoning": "high intent", "kind": "target"},
        ],
        "topics": [
            topic_json("Broken Topic", ""),
            topic_json("Implant Basics", "dental implants"),
        ],
    });
    let fx = fixture(reply, None);
    let account_id = fx.accounts.seed(account(AccountHealth::Active)).await;

    let outcome = fx
        .conductor
        .run_cycle(account_id, "manual")
        .await
        .expect("cycle completes despite the failing topic");

    assert_eq!(outcome.content_pieces.len(), 1);
    assert_eq!(outcome.topic_errors.len(), 1);
    assert!(outcome.topic_errors[0].starts_with("Broken Topic:"));
}

#[tokio::test]
async fn weekly_fanout_skips_inactive_and_isolates_failures() {
    // The performance source errors for the third account only.
    let broken = account(AccountHealth::Active);
    let broken_id = broken.id;
    let fx = fixture(three_topic_reply(), Some(broken_id));
    let healthy_id = fx.accounts.seed(account(AccountHealth::Active)).await;
    let disconnected_id = fx.accounts.seed(account(AccountHealth::Disconnected)).await;
    fx.accounts.seed(broken).await;

    let report = fx
        .conductor
        .run_weekly_cycle()
        .await
        .expect("fan-out always returns a report");

    assert_eq!(report.triggered, 2);
    assert_eq!(report.results.len(), 3);

    let status_of = |id: Uuid| {
        report
            .results
            .iter()
            .find(|r| r.account_id == id)
            .expect("every account is reported")
    };
    assert_eq!(status_of(healthy_id).status, CycleStatus::Completed);
    assert_eq!(status_of(disconnected_id).status, CycleStatus::Skipped);

    let failed = status_of(broken_id);
    assert_eq!(failed.status, CycleStatus::Error);
    assert!(
        failed
            .error
            .as_deref()
            .is_some_and(|e| e.contains("search console unavailable"))
    );
}
