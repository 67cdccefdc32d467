//! Keyword pipeline behavior: seeding, the gap filter, persistence, and
//! competitor fault isolation.

use async_trait::async_trait;
use drumbeat_core::{
    AccountHealth, AccountProfile, CompletionRequest, CompletionResponse, KeywordKind,
    KeywordMetrics, QueueAction, QueueSeverity, RunStatus, SearchPerformanceRow,
};
use drumbeat_error::{CompletionError, DrumbeatResult};
use drumbeat_interface::{
    CompletionDriver, KeywordResearch, KeywordStore, ReviewQueueStore, RunStore,
    SearchPerformanceSource,
};
use drumbeat_pipelines::{Scholar, scholar};
use drumbeat_store::{MemoryKeywordStore, MemoryQueueStore, MemoryRunStore};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

fn metrics(keyword: &str, volume: u64, difficulty: u8) -> KeywordMetrics {
    KeywordMetrics {
        keyword: keyword.to_string(),
        search_volume: volume,
        difficulty,
        cpc: 1.5,
        competition: 0.4,
    }
}

fn row(query: &str) -> SearchPerformanceRow {
    SearchPerformanceRow {
        query: query.to_string(),
        clicks: 12,
        impressions: 300,
        ctr: 0.04,
        position: 8.2,
    }
}

fn account() -> AccountProfile {
    AccountProfile {
        id: Uuid::new_v4(),
        name: "Bright Smile Dental".to_string(),
        vertical: "dental".to_string(),
        city: "Austin".to_string(),
        services: vec!["dental implants".to_string()],
        competitors: vec!["rival-dental.example".to_string()],
        health: AccountHealth::Active,
        cms: None,
    }
}

struct FakeResearch {
    researched: Vec<KeywordMetrics>,
    competitor: Vec<KeywordMetrics>,
    failing_domain: Option<String>,
}

#[async_trait]
impl KeywordResearch for FakeResearch {
    async fn bulk_research(&self, _seeds: &[String]) -> DrumbeatResult<Vec<KeywordMetrics>> {
        Ok(self.researched.clone())
    }

    async fn competitor_keywords(&self, domain: &str) -> DrumbeatResult<Vec<KeywordMetrics>> {
        if self.failing_domain.as_deref() == Some(domain) {
            return Err(CompletionError::new("domain lookup timed out").into());
        }
        Ok(self.competitor.clone())
    }
}

struct FakePerformance {
    rows: Vec<SearchPerformanceRow>,
}

#[async_trait]
impl SearchPerformanceSource for FakePerformance {
    async fn search_performance(
        &self,
        _account_id: Uuid,
        days: u32,
        limit: usize,
    ) -> DrumbeatResult<Vec<SearchPerformanceRow>> {
        assert_eq!(days, 90);
        assert_eq!(limit, 500);
        Ok(self.rows.clone())
    }
}

/// Answers only the prioritization prompt.
struct RankingDriver {
    reply: String,
}

#[async_trait]
impl CompletionDriver for RankingDriver {
    async fn complete(&self, req: &CompletionRequest) -> DrumbeatResult<CompletionResponse> {
        assert!(req.messages[0].content.contains("SEO strategist"));
        Ok(CompletionResponse {
            text: self.reply.clone(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-1"
    }
}

struct Fixture {
    pipeline: Scholar,
    runs: Arc<MemoryRunStore>,
    keywords: Arc<MemoryKeywordStore>,
    queue: Arc<MemoryQueueStore>,
}

fn fixture(research: FakeResearch, performance: FakePerformance, reply: serde_json::Value) -> Fixture {
    let runs = Arc::new(MemoryRunStore::new());
    let keywords = Arc::new(MemoryKeywordStore::new());
    let queue = Arc::new(MemoryQueueStore::new());
    let pipeline = Scholar::new(
        Arc::new(RankingDriver {
            reply: reply.to_string(),
        }),
        Arc::new(research),
        Arc::new(performance),
        Arc::clone(&runs) as Arc<dyn RunStore>,
        Arc::clone(&keywords) as Arc<dyn KeywordStore>,
        Arc::clone(&queue) as Arc<dyn ReviewQueueStore>,
    );
    Fixture {
        pipeline,
        runs,
        keywords,
        queue,
    }
}

#[test]
fn seed_phrases_expand_every_service_through_every_template() {
    let seeds = scholar::seed_phrases(&account());
    assert_eq!(
        seeds,
        vec![
            "dental implants near me",
            "dental implants Austin",
            "best dental implants Austin",
            "dental implants cost Austin",
        ]
    );
}

#[test]
fn seed_phrases_fall_back_to_the_default_service_list() {
    let mut acct = account();
    acct.services.clear();
    let seeds = scholar::seed_phrases(&acct);
    // 4 default services by 4 templates.
    assert_eq!(seeds.len(), 16);
    assert_eq!(seeds[0], "dentist near me");
    assert!(seeds.contains(&"teeth whitening cost Austin".to_string()));
}

#[test]
fn gap_analysis_filters_dedupes_and_sorts() {
    let performance = vec![row("emergency dentist austin")];
    let researched = vec![metrics("dental implants austin", 900, 40)];
    let competitors = vec![
        // Already queried for: excluded.
        metrics("Emergency Dentist Austin", 400, 30),
        // Already researched: excluded.
        metrics("dental implants austin", 900, 40),
        // Volume at the floor: excluded.
        metrics("rare niche phrase", 50, 10),
        // Difficulty at the ceiling: excluded.
        metrics("competitive phrase", 5000, 60),
        // Kept, and the later duplicate dropped.
        metrics("invisalign austin", 700, 35),
        metrics("Invisalign Austin", 9999, 10),
        metrics("sedation dentistry austin", 800, 45),
    ];

    let gaps = scholar::gap_analysis(&performance, &researched, &competitors);
    assert_eq!(
        gaps.iter().map(|m| m.keyword.as_str()).collect::<Vec<_>>(),
        vec!["sedation dentistry austin", "invisalign austin"]
    );
    // First occurrence wins the dedupe.
    assert_eq!(gaps[1].search_volume, 700);
}

#[test]
fn gap_analysis_caps_at_fifty() {
    let competitors: Vec<KeywordMetrics> = (0..80)
        .map(|i| metrics(&format!("keyword {i}"), 100 + i, 20))
        .collect();
    let gaps = scholar::gap_analysis(&[], &[], &competitors);
    assert_eq!(gaps.len(), 50);
    assert_eq!(gaps[0].search_volume, 179);
}

#[tokio::test]
async fn full_run_persists_keywords_and_topic_recommendations() {
    let research = FakeResearch {
        researched: vec![metrics("dental implants austin", 900, 40)],
        competitor: vec![metrics("invisalign austin", 700, 35)],
        failing_domain: None,
    };
    let performance = FakePerformance {
        rows: vec![row("bright smile dental")],
    };
    let reply = json!({
        "keywords": [
            {"keyword": "dental implants austin", "reasoning": "high intent", "kind": "target"},
            {"keyword": "invisalign austin", "reasoning": "competitor gap", "kind": "gap"},
            {"keyword": "smile makeover austin", "reasoning": "adjacent", "kind": "mystery"},
        ],
        "topics": [
            {"title": "Invisalign in Austin", "angle": "cost and timeline", "keyword": "invisalign austin", "estimated_volume": 700},
        ],
    });
    let fx = fixture(research, performance, reply);

    let acct = account();
    let outcome = fx.pipeline.run(&acct, "manual").await.expect("run completes");
    assert_eq!(outcome.keywords_saved, 3);
    assert_eq!(outcome.topics.len(), 1);
    assert!(outcome.competitor_errors.is_empty());

    let saved = fx.keywords.list_for_account(acct.id).await.expect("keywords");
    assert_eq!(saved.len(), 3);

    let implants = saved
        .iter()
        .find(|k| k.text == "dental implants austin")
        .expect("researched keyword saved");
    assert_eq!(implants.search_volume, Some(900));
    assert_eq!(implants.difficulty, Some(40));
    assert_eq!(implants.kind, KeywordKind::Target);
    assert_eq!(implants.source, "scholar");

    let gap = saved
        .iter()
        .find(|k| k.text == "invisalign austin")
        .expect("gap keyword saved");
    assert_eq!(gap.search_volume, Some(700));
    assert_eq!(gap.kind, KeywordKind::Gap);

    // Unknown classification tags default to target, metrics unknown.
    let adjacent = saved
        .iter()
        .find(|k| k.text == "smile makeover austin")
        .expect("adjacent keyword saved");
    assert_eq!(adjacent.kind, KeywordKind::Target);
    assert_eq!(adjacent.search_volume, None);

    assert_eq!(outcome.queue_item_ids.len(), 1);
    let item = fx.queue.get(outcome.queue_item_ids[0]).await.expect("item");
    assert_eq!(item.action, QueueAction::ContentRecommendation);
    assert_eq!(item.severity, QueueSeverity::Info);
    assert_eq!(item.proposed["title"], json!("Invisalign in Austin"));
    assert_eq!(item.content_id, None);

    let run = fx.runs.get(outcome.run_id).await.expect("run");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.result.expect("result")["keywords"], json!(3));
}

#[tokio::test]
async fn failing_competitor_domain_is_recorded_without_failing_the_run() {
    let research = FakeResearch {
        researched: vec![metrics("dental implants austin", 900, 40)],
        competitor: vec![],
        failing_domain: Some("rival-dental.example".to_string()),
    };
    let performance = FakePerformance { rows: vec![] };
    let reply = json!({
        "keywords": [
            {"keyword": "dental implants austin", "reasoning": "high intent", "kind": "target"},
        ],
        "topics": [],
    });
    let fx = fixture(research, performance, reply);

    let outcome = fx
        .pipeline
        .run(&account(), "weekly")
        .await
        .expect("run completes despite the failing domain");

    assert_eq!(outcome.competitor_errors.len(), 1);
    assert!(outcome.competitor_errors[0].starts_with("rival-dental.example:"));

    let run = fx.runs.get(outcome.run_id).await.expect("run");
    assert_eq!(run.status, RunStatus::Completed);
    let errors = &run.result.expect("result")["competitor_errors"];
    assert_eq!(errors.as_array().map(Vec::len), Some(1));
}
