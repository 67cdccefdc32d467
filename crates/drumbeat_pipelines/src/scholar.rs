//! Keyword research pipeline.
//!
//! Linear stage machine, fail-fast on stage error. Competitor lookups are
//! the one exception: each domain is fetched independently and a failing
//! domain is recorded and skipped rather than failing the run.

use chrono::Utc;
use drumbeat_core::{
    AccountProfile, CompletionRequest, Keyword, KeywordKind, KeywordMetrics, PipelineName,
    QueueAction, QueueSeverity, QueueStatus, ReviewQueueItem, Run, SearchPerformanceRow, Topic,
    extraction::extract_json,
};
use drumbeat_error::{DrumbeatResult, PipelineError, PipelineErrorKind};
use drumbeat_interface::{
    CompletionDriver, KeywordResearch, KeywordStore, ReviewQueueStore, RunStore,
    SearchPerformanceSource,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Trailing window for the account's own search queries.
const PERFORMANCE_WINDOW_DAYS: u32 = 90;
/// Row cap on the search-performance pull.
const PERFORMANCE_ROW_LIMIT: usize = 500;
/// Gap keywords must clear this volume.
const GAP_MIN_VOLUME: u64 = 50;
/// Gap keywords must sit under this difficulty.
const GAP_MAX_DIFFICULTY: u8 = 60;
/// Gap list cap.
const GAP_CAP: usize = 50;
/// Keyword pool cap for the prioritization prompt.
const PRIORITIZE_POOL_CAP: usize = 100;
/// Ranked keywords requested from the completion service.
const PRIORITIZE_KEYWORD_CAP: usize = 30;
/// Content-topic proposals requested.
const PRIORITIZE_TOPIC_CAP: usize = 5;

/// Seed templates applied to each declared service.
const SEED_TEMPLATES: &[&str] = &[
    "{service} near me",
    "{service} {city}",
    "best {service} {city}",
    "{service} cost {city}",
];

/// Fallback services when an account declares none.
const DEFAULT_DENTAL_SERVICES: &[&str] = &[
    "dentist",
    "teeth cleaning",
    "dental implants",
    "teeth whitening",
];

/// Stages of the keyword research pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ScholarStage {
    /// Pull the account's own top queries
    FetchSearchPerformance,
    /// Bulk-research seed phrases
    ResearchKeywords,
    /// Fetch each competitor domain's ranking keywords
    AnalyzeCompetitors,
    /// Compute the competitor-only keyword gap
    GapAnalysis,
    /// LLM ranking plus content-topic proposals
    Prioritize,
    /// Persist keywords and topic recommendations
    SaveResults,
}

/// One ranked keyword from the prioritization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedKeyword {
    /// The search term
    pub keyword: String,
    /// Why it ranked where it did
    pub reasoning: String,
    /// Classification
    pub kind: KeywordKind,
}

#[derive(Debug, Deserialize)]
struct RankedKeywordWire {
    keyword: String,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct PrioritizedWire {
    #[serde(default)]
    keywords: Vec<RankedKeywordWire>,
    #[serde(default)]
    topics: Vec<Topic>,
}

/// Mutable state threaded through the interpreter loop.
#[derive(Default)]
pub struct ScholarState {
    /// The account's own queries, once fetched
    pub performance: Option<Vec<SearchPerformanceRow>>,
    /// Seed research results, once fetched
    pub researched: Option<Vec<KeywordMetrics>>,
    /// Pooled competitor keywords, once fetched
    pub competitors: Option<Vec<KeywordMetrics>>,
    /// Per-domain fetch failures, recorded and skipped
    pub competitor_errors: Vec<String>,
    /// Gap-analysis output, once computed
    pub gaps: Option<Vec<KeywordMetrics>>,
    /// Ranked keywords plus topic proposals, once prioritized
    pub prioritized: Option<(Vec<RankedKeyword>, Vec<Topic>)>,
    /// Terminal summary; present once results are saved
    pub outcome: Option<ScholarOutcome>,
}

/// Pure routing function: which stage runs next, given the state.
pub fn next_stage(state: &ScholarState) -> Option<ScholarStage> {
    if state.outcome.is_some() {
        return None;
    }
    if state.performance.is_none() {
        return Some(ScholarStage::FetchSearchPerformance);
    }
    if state.researched.is_none() {
        return Some(ScholarStage::ResearchKeywords);
    }
    if state.competitors.is_none() {
        return Some(ScholarStage::AnalyzeCompetitors);
    }
    if state.gaps.is_none() {
        return Some(ScholarStage::GapAnalysis);
    }
    if state.prioritized.is_none() {
        return Some(ScholarStage::Prioritize);
    }
    Some(ScholarStage::SaveResults)
}

/// Result summary of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScholarOutcome {
    /// Run record id
    pub run_id: Uuid,
    /// Keywords upserted
    pub keywords_saved: usize,
    /// Content-topic proposals, in priority order
    pub topics: Vec<Topic>,
    /// Queue items created for the proposals
    pub queue_item_ids: Vec<Uuid>,
    /// Competitor domains that failed to fetch
    pub competitor_errors: Vec<String>,
}

/// The keyword research pipeline.
pub struct Scholar {
    driver: Arc<dyn CompletionDriver>,
    research: Arc<dyn KeywordResearch>,
    performance: Arc<dyn SearchPerformanceSource>,
    runs: Arc<dyn RunStore>,
    keywords: Arc<dyn KeywordStore>,
    queue: Arc<dyn ReviewQueueStore>,
}

impl Scholar {
    /// Wire a pipeline from its collaborators.
    pub fn new(
        driver: Arc<dyn CompletionDriver>,
        research: Arc<dyn KeywordResearch>,
        performance: Arc<dyn SearchPerformanceSource>,
        runs: Arc<dyn RunStore>,
        keywords: Arc<dyn KeywordStore>,
        queue: Arc<dyn ReviewQueueStore>,
    ) -> Self {
        Self {
            driver,
            research,
            performance,
            runs,
            keywords,
            queue,
        }
    }

    /// Research, rank, and persist keywords and topic proposals.
    #[instrument(skip(self, account), fields(account_id = %account.id))]
    pub async fn run(
        &self,
        account: &AccountProfile,
        trigger: &str,
    ) -> DrumbeatResult<ScholarOutcome> {
        let run = Run::start(account.id, PipelineName::Scholar, trigger);
        let run_id = run.id;
        self.runs.create(run).await?;

        let mut state = ScholarState::default();
        while let Some(stage) = next_stage(&state) {
            debug!(%stage, "Entering stage");
            if let Err(e) = self.execute(stage, account, run_id, &mut state).await {
                let message = e.to_string();
                if let Err(store_err) = self.runs.fail(run_id, &message).await {
                    warn!(error = %store_err, "Failed to record run failure");
                }
                return Err(e);
            }
        }

        state.outcome.ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::StageFailed {
                stage: ScholarStage::SaveResults.to_string(),
                message: "pipeline ended without an outcome".to_string(),
            })
            .into()
        })
    }

    async fn execute(
        &self,
        stage: ScholarStage,
        account: &AccountProfile,
        run_id: Uuid,
        state: &mut ScholarState,
    ) -> DrumbeatResult<()> {
        match stage {
            ScholarStage::FetchSearchPerformance => {
                let rows = self
                    .performance
                    .search_performance(account.id, PERFORMANCE_WINDOW_DAYS, PERFORMANCE_ROW_LIMIT)
                    .await?;
                debug!(rows = rows.len(), "Fetched search performance");
                state.performance = Some(rows);
                Ok(())
            }
            ScholarStage::ResearchKeywords => {
                let seeds = seed_phrases(account);
                let researched = self.research.bulk_research(&seeds).await?;
                debug!(seeds = seeds.len(), results = researched.len(), "Seed research done");
                state.researched = Some(researched);
                Ok(())
            }
            ScholarStage::AnalyzeCompetitors => {
                self.analyze_competitors(account, state).await;
                Ok(())
            }
            ScholarStage::GapAnalysis => {
                state.gaps = Some(gap_analysis(
                    state.performance.as_deref().unwrap_or_default(),
                    state.researched.as_deref().unwrap_or_default(),
                    state.competitors.as_deref().unwrap_or_default(),
                ));
                Ok(())
            }
            ScholarStage::Prioritize => self.prioritize(account, state).await,
            ScholarStage::SaveResults => self.save_results(account, run_id, state).await,
        }
    }

    /// Sequential per-domain fetch; a failing domain never fails the run.
    async fn analyze_competitors(&self, account: &AccountProfile, state: &mut ScholarState) {
        let mut pooled = Vec::new();
        for domain in &account.competitors {
            match self.research.competitor_keywords(domain).await {
                Ok(mut metrics) => pooled.append(&mut metrics),
                Err(e) => {
                    warn!(domain = %domain, error = %e, "Competitor fetch failed, skipping");
                    state.competitor_errors.push(format!("{domain}: {e}"));
                }
            }
        }
        state.competitors = Some(pooled);
    }

    async fn prioritize(
        &self,
        account: &AccountProfile,
        state: &mut ScholarState,
    ) -> DrumbeatResult<()> {
        let performance = state
            .performance
            .as_deref()
            .unwrap_or_default();
        let mut pool: Vec<&KeywordMetrics> = state
            .researched
            .iter()
            .flatten()
            .chain(state.gaps.iter().flatten())
            .collect();
        pool.truncate(PRIORITIZE_POOL_CAP);

        let system = format!(
            "You are an SEO strategist for local healthcare practices. From the \
             keyword pool, pick the top {PRIORITIZE_KEYWORD_CAP} keywords and up to \
             {PRIORITIZE_TOPIC_CAP} content topics. Respond with a single JSON object: \
             {{\"keywords\": [{{\"keyword\", \"reasoning\", \"kind\": \
             \"target|gap|branded|tracked\"}}], \"topics\": [{{\"title\", \"angle\", \
             \"keyword\", \"estimated_volume\"}}]}}."
        );
        let user = format!(
            "Practice: {profile}\nRecent own queries: {queries}\nKeyword pool: {pool}",
            profile = serde_json::to_string(&json!({
                "name": account.name,
                "vertical": account.vertical,
                "city": account.city,
                "services": account.services,
            }))
            .unwrap_or_default(),
            queries = serde_json::to_string(
                &performance.iter().map(|r| &r.query).collect::<Vec<_>>()
            )
            .unwrap_or_default(),
            pool = serde_json::to_string(&pool).unwrap_or_default(),
        );

        let response = self
            .driver
            .complete(&CompletionRequest::from_prompt(system, user))
            .await?;
        let payload = extract_json(&response.text).ok_or_else(|| {
            PipelineError::new(PipelineErrorKind::StageFailed {
                stage: ScholarStage::Prioritize.to_string(),
                message: "completion contained no JSON payload".to_string(),
            })
        })?;
        let wire: PrioritizedWire = serde_json::from_str(&payload).map_err(|e| {
            PipelineError::new(PipelineErrorKind::StageFailed {
                stage: ScholarStage::Prioritize.to_string(),
                message: format!("completion JSON did not match the expected shape: {e}"),
            })
        })?;

        let mut ranked: Vec<RankedKeyword> = wire
            .keywords
            .into_iter()
            .map(|w| RankedKeyword {
                kind: parse_kind(&w.kind),
                keyword: w.keyword,
                reasoning: w.reasoning,
            })
            .collect();
        ranked.truncate(PRIORITIZE_KEYWORD_CAP);
        let mut topics = wire.topics;
        topics.truncate(PRIORITIZE_TOPIC_CAP);

        info!(keywords = ranked.len(), topics = topics.len(), "Prioritization done");
        state.prioritized = Some((ranked, topics));
        Ok(())
    }

    async fn save_results(
        &self,
        account: &AccountProfile,
        run_id: Uuid,
        state: &mut ScholarState,
    ) -> DrumbeatResult<()> {
        let (ranked, topics) = state
            .prioritized
            .clone()
            .ok_or_else(|| {
                PipelineError::new(PipelineErrorKind::StageFailed {
                    stage: ScholarStage::SaveResults.to_string(),
                    message: "stage entered without prioritized keywords".to_string(),
                })
            })?;

        let metrics_by_text: std::collections::HashMap<String, &KeywordMetrics> = state
            .researched
            .iter()
            .flatten()
            .chain(state.gaps.iter().flatten())
            .map(|m| (m.keyword.to_lowercase(), m))
            .collect();

        for keyword in &ranked {
            let metrics = metrics_by_text.get(&keyword.keyword.to_lowercase());
            self.keywords
                .upsert(Keyword {
                    id: Uuid::new_v4(),
                    account_id: account.id,
                    text: keyword.keyword.clone(),
                    position: None,
                    previous_position: None,
                    best_position: None,
                    search_volume: metrics.map(|m| m.search_volume),
                    difficulty: metrics.map(|m| m.difficulty),
                    kind: keyword.kind,
                    source: "scholar".to_string(),
                    last_checked_at: None,
                })
                .await?;
        }

        let mut queue_item_ids = Vec::with_capacity(topics.len());
        for topic in &topics {
            let item = ReviewQueueItem {
                id: Uuid::new_v4(),
                account_id: account.id,
                content_id: None,
                action: QueueAction::ContentRecommendation,
                proposed: json!(topic),
                rollback: None,
                severity: QueueSeverity::Info,
                status: QueueStatus::Pending,
                approver: None,
                decided_at: None,
                deployed_at: None,
                created_at: Utc::now(),
            };
            queue_item_ids.push(item.id);
            self.queue.insert(item).await?;
        }

        self.runs
            .complete(
                run_id,
                json!({
                    "keywords": ranked.len(),
                    "topics": topics.len(),
                    "competitor_errors": state.competitor_errors,
                }),
            )
            .await?;

        state.outcome = Some(ScholarOutcome {
            run_id,
            keywords_saved: ranked.len(),
            topics,
            queue_item_ids,
            competitor_errors: state.competitor_errors.clone(),
        });
        Ok(())
    }
}

/// Seed phrases from services and location templates.
pub fn seed_phrases(account: &AccountProfile) -> Vec<String> {
    let services: Vec<String> = if account.services.is_empty() {
        DEFAULT_DENTAL_SERVICES.iter().map(|s| s.to_string()).collect()
    } else {
        account.services.clone()
    };

    let mut seeds = Vec::with_capacity(services.len() * SEED_TEMPLATES.len());
    for service in &services {
        for template in SEED_TEMPLATES {
            seeds.push(
                template
                    .replace("{service}", service)
                    .replace("{city}", &account.city),
            );
        }
    }
    seeds
}

/// Competitor keywords the account neither queries for nor researched,
/// filtered to volume over 50 and difficulty under 60, sorted by volume
/// descending, capped at 50.
pub fn gap_analysis(
    performance: &[SearchPerformanceRow],
    researched: &[KeywordMetrics],
    competitors: &[KeywordMetrics],
) -> Vec<KeywordMetrics> {
    let own: HashSet<String> = performance
        .iter()
        .map(|r| r.query.to_lowercase())
        .chain(researched.iter().map(|m| m.keyword.to_lowercase()))
        .collect();

    let mut seen = HashSet::new();
    let mut gaps: Vec<KeywordMetrics> = competitors
        .iter()
        .filter(|m| {
            let text = m.keyword.to_lowercase();
            !own.contains(&text)
                && m.search_volume > GAP_MIN_VOLUME
                && m.difficulty < GAP_MAX_DIFFICULTY
                && seen.insert(text)
        })
        .cloned()
        .collect();
    gaps.sort_by(|a, b| b.search_volume.cmp(&a.search_volume));
    gaps.truncate(GAP_CAP);
    gaps
}

fn parse_kind(tag: &str) -> KeywordKind {
    match tag.to_lowercase().as_str() {
        "gap" => KeywordKind::Gap,
        "branded" => KeywordKind::Branded,
        "tracked" => KeywordKind::Tracked,
        _ => KeywordKind::Target,
    }
}
