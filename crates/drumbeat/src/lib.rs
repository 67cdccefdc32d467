//! Drumbeat: marketing-operations automation for managed local-practice
//! accounts.
//!
//! The facade wires the concrete clients, the compliance engine, and the
//! in-memory stores into the three pipelines and the review surface. All
//! collaborators are constructed once here and shared behind `Arc`; the
//! pipelines themselves only ever see the trait seams.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;

pub use config::{AnthropicSettings, DrumbeatConfig, KeywordApiSettings, OAuthSettings};

pub use drumbeat_compliance::ComplianceEngine;
pub use drumbeat_core::{
    AccountHealth, AccountProfile, ComplianceStatus, ContentPiece, ContentStatus, Keyword,
    KeywordKind, PipelineName, QueueAction, QueueSeverity, QueueStatus, ReviewQueueItem, Run,
    RunStatus, Topic, telemetry::init_telemetry,
};
pub use drumbeat_error::{DrumbeatError, DrumbeatErrorKind, DrumbeatResult};
pub use drumbeat_integrations::{
    AnthropicDriver, CmsClient, CmsPublisher, KeywordApiClient, OAuthConfig, ProfileClient,
    ProfilePerformanceSource, TokenManager,
};
pub use drumbeat_pipelines::{
    BulkApproveReport, Conductor, CycleOutcome, CycleStatus, Ghostwriter, ReviewOps, Scholar,
    WeeklyCycleReport,
};
pub use drumbeat_store::{
    MemoryAccountStore, MemoryContentStore, MemoryKeywordStore, MemoryQueueStore, MemoryRunStore,
    MemoryTokenStore,
};

use drumbeat_interface::{
    AccountStore, CompletionDriver, ContentPublisher, ContentStore, KeywordResearch, KeywordStore,
    ReviewQueueStore, RunStore, SearchPerformanceSource,
};
use std::sync::Arc;
use tracing::info;

/// A fully wired Drumbeat process.
///
/// Stores are the in-memory implementations; embedders that need durable
/// state swap them at the trait seams before wiring the pipelines.
pub struct Drumbeat {
    accounts: Arc<MemoryAccountStore>,
    runs: Arc<MemoryRunStore>,
    content: Arc<MemoryContentStore>,
    queue: Arc<MemoryQueueStore>,
    keywords: Arc<MemoryKeywordStore>,
    token_manager: Arc<TokenManager>,
    scholar: Arc<Scholar>,
    ghostwriter: Arc<Ghostwriter>,
    conductor: Conductor,
    review: ReviewOps,
}

impl Drumbeat {
    /// Wire every collaborator from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the compliance rule set fails to compile.
    pub fn new(config: DrumbeatConfig) -> DrumbeatResult<Self> {
        let accounts = Arc::new(MemoryAccountStore::new());
        let runs = Arc::new(MemoryRunStore::new());
        let content = Arc::new(MemoryContentStore::new());
        let queue = Arc::new(MemoryQueueStore::new());
        let keywords = Arc::new(MemoryKeywordStore::new());
        let tokens = Arc::new(MemoryTokenStore::new());

        let driver: Arc<dyn CompletionDriver> = Arc::new(AnthropicDriver::new(
            config.anthropic.api_key,
            config.anthropic.model,
        ));
        let engine = Arc::new(ComplianceEngine::new()?.with_driver(Arc::clone(&driver)));

        let mut keyword_client = KeywordApiClient::new(config.keyword_api.api_key);
        if let Some(base_url) = config.keyword_api.base_url {
            keyword_client = keyword_client.with_base_url(base_url);
        }
        let research: Arc<dyn KeywordResearch> = Arc::new(keyword_client);

        let profile_base_url = config.oauth.profile_base_url.clone();
        let token_manager = Arc::new(TokenManager::new(
            config.oauth.into(),
            tokens as Arc<dyn drumbeat_interface::TokenStore>,
            Arc::clone(&accounts) as Arc<dyn AccountStore>,
        ));
        let mut performance_source = ProfilePerformanceSource::new(Arc::clone(&token_manager));
        if let Some(base_url) = profile_base_url {
            performance_source = performance_source.with_base_url(base_url);
        }
        let performance: Arc<dyn SearchPerformanceSource> = Arc::new(performance_source);
        let publisher: Arc<dyn ContentPublisher> = Arc::new(CmsPublisher::default());

        let scholar = Arc::new(Scholar::new(
            Arc::clone(&driver),
            research,
            performance,
            Arc::clone(&runs) as Arc<dyn RunStore>,
            Arc::clone(&keywords) as Arc<dyn KeywordStore>,
            Arc::clone(&queue) as Arc<dyn ReviewQueueStore>,
        ));
        let ghostwriter = Arc::new(Ghostwriter::new(
            driver,
            engine,
            Arc::clone(&runs) as Arc<dyn RunStore>,
            Arc::clone(&content) as Arc<dyn ContentStore>,
            Arc::clone(&queue) as Arc<dyn ReviewQueueStore>,
        ));
        let conductor = Conductor::new(
            Arc::clone(&scholar),
            Arc::clone(&ghostwriter),
            Arc::clone(&accounts) as Arc<dyn AccountStore>,
            Arc::clone(&runs) as Arc<dyn RunStore>,
        );
        let review = ReviewOps::new(
            Arc::clone(&queue) as Arc<dyn ReviewQueueStore>,
            Arc::clone(&content) as Arc<dyn ContentStore>,
            Arc::clone(&accounts) as Arc<dyn AccountStore>,
            publisher,
        );

        info!("Drumbeat wired");
        Ok(Self {
            accounts,
            runs,
            content,
            queue,
            keywords,
            token_manager,
            scholar,
            ghostwriter,
            conductor,
            review,
        })
    }

    /// Account store.
    pub fn accounts(&self) -> &Arc<MemoryAccountStore> {
        &self.accounts
    }

    /// Pipeline-run store.
    pub fn runs(&self) -> &Arc<MemoryRunStore> {
        &self.runs
    }

    /// Content store.
    pub fn content(&self) -> &Arc<MemoryContentStore> {
        &self.content
    }

    /// Review-queue store.
    pub fn queue(&self) -> &Arc<MemoryQueueStore> {
        &self.queue
    }

    /// Keyword store.
    pub fn keywords(&self) -> &Arc<MemoryKeywordStore> {
        &self.keywords
    }

    /// OAuth token manager.
    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.token_manager
    }

    /// Keyword research pipeline.
    pub fn scholar(&self) -> &Arc<Scholar> {
        &self.scholar
    }

    /// Content generation pipeline.
    pub fn ghostwriter(&self) -> &Arc<Ghostwriter> {
        &self.ghostwriter
    }

    /// Campaign conductor.
    pub fn conductor(&self) -> &Conductor {
        &self.conductor
    }

    /// Review-queue decision surface.
    pub fn review(&self) -> &ReviewOps {
        &self.review
    }
}
