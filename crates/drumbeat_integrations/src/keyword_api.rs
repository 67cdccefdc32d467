//! Keyword-research API client.
//!
//! Bulk keyword research, competitor lookup, and rank-tracking project
//! management. Retry policy: 429 honors the server's `Retry-After` and
//! retries without a ceiling (the server dictates the wait), 401 is fatal,
//! and 5xx gets exactly one retry after a fixed delay.

use async_trait::async_trait;
use drumbeat_core::{KeywordMetrics, KeywordPosition};
use drumbeat_error::{DrumbeatResult, HttpError, IntegrationError, IntegrationErrorKind};
use drumbeat_interface::KeywordResearch;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_BASE_URL: &str = "https://api.keywardens.io/v3";
/// Request timeout; the API answers bulk research well inside this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Seeds per bulk-research call.
const RESEARCH_BATCH_SIZE: usize = 10;
/// Keywords per rank-tracking submission.
const TRACKING_BATCH_SIZE: usize = 50;
/// Pause between consecutive batches.
const BATCH_DELAY: Duration = Duration::from_millis(500);
/// Fixed wait before the single 5xx retry.
const SERVER_ERROR_RETRY_DELAY: Duration = Duration::from_millis(2000);
/// Wait applied when a 429 arrives without a parseable Retry-After.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Client for the keyword-research API, authenticated by a static API key.
#[derive(Debug, Clone)]
pub struct KeywordApiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

/// Outcome of a batched rank-tracking submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingBatchReport {
    /// Keywords accepted by the API
    pub submitted: usize,
    /// Batches sent
    pub batches: usize,
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    id: String,
}

impl KeywordApiClient {
    /// Create a client against the production endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the endpoint (tests, staging).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send one request, applying the client's retry policy.
    ///
    /// 429: sleep for `Retry-After`, retry without a ceiling. 401: fatal.
    /// 5xx: one retry after a fixed 2000 ms, then fail.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&JsonValue>,
    ) -> DrumbeatResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut retried_server_error = false;

        loop {
            let mut builder = self
                .http
                .request(method.clone(), &url)
                .header("x-api-key", &self.api_key);
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| HttpError::new(format!("keyword API request failed: {e}")))?;

            match response.status() {
                StatusCode::TOO_MANY_REQUESTS => {
                    let wait = retry_after(&response).unwrap_or(DEFAULT_RETRY_AFTER);
                    warn!(path, wait_secs = wait.as_secs(), "Rate limited, honoring Retry-After");
                    tokio::time::sleep(wait).await;
                }
                StatusCode::UNAUTHORIZED => {
                    return Err(IntegrationError::new(IntegrationErrorKind::InvalidApiKey).into());
                }
                status if status.is_server_error() => {
                    if retried_server_error {
                        return Err(IntegrationError::new(
                            IntegrationErrorKind::RetriesExhausted(format!(
                                "{path} still failing with {status} after retry"
                            )),
                        )
                        .into());
                    }
                    warn!(path, %status, "Server error, retrying once");
                    retried_server_error = true;
                    tokio::time::sleep(SERVER_ERROR_RETRY_DELAY).await;
                }
                status if !status.is_success() => {
                    let message = response.text().await.unwrap_or_default();
                    return Err(IntegrationError::new(IntegrationErrorKind::ApiError {
                        status: status.as_u16(),
                        message,
                    })
                    .into());
                }
                _ => return Ok(response),
            }
        }
    }

    /// Research one batch of seed phrases (at most 10).
    async fn research_batch(&self, seeds: &[String]) -> DrumbeatResult<Vec<KeywordMetrics>> {
        let response = self
            .request(
                Method::POST,
                "/keywords/research",
                Some(&json!({ "keywords": seeds })),
            )
            .await?;
        response.json().await.map_err(|e| {
            IntegrationError::new(IntegrationErrorKind::UnexpectedResponse(format!(
                "research response: {e}"
            )))
            .into()
        })
    }

    /// Bulk keyword research.
    ///
    /// Seeds are batched in groups of 10 with a 500 ms pause between
    /// batches; results are deduplicated by keyword text, first occurrence
    /// winning.
    #[instrument(skip(self, seeds), fields(seed_count = seeds.len()))]
    pub async fn bulk_research(&self, seeds: &[String]) -> DrumbeatResult<Vec<KeywordMetrics>> {
        let mut results = Vec::new();
        let mut seen = HashSet::new();

        for (index, batch) in seeds.chunks(RESEARCH_BATCH_SIZE).enumerate() {
            if index > 0 {
                tokio::time::sleep(BATCH_DELAY).await;
            }
            debug!(batch = index, size = batch.len(), "Researching seed batch");
            for metrics in self.research_batch(batch).await? {
                if seen.insert(metrics.keyword.to_lowercase()) {
                    results.push(metrics);
                }
            }
        }

        debug!(unique = results.len(), "Bulk research finished");
        Ok(results)
    }

    /// Keywords a competitor domain ranks for.
    #[instrument(skip(self))]
    pub async fn competitor_keywords(&self, domain: &str) -> DrumbeatResult<Vec<KeywordMetrics>> {
        let response = self
            .request(Method::GET, &format!("/domains/{domain}/keywords"), None)
            .await?;
        response.json().await.map_err(|e| {
            IntegrationError::new(IntegrationErrorKind::UnexpectedResponse(format!(
                "competitor response: {e}"
            )))
            .into()
        })
    }

    /// Create a rank-tracking project, returning its id.
    #[instrument(skip(self))]
    pub async fn create_project(&self, name: &str, domain: &str) -> DrumbeatResult<String> {
        let response = self
            .request(
                Method::POST,
                "/projects",
                Some(&json!({ "name": name, "domain": domain })),
            )
            .await?;
        let project: ProjectResponse = response.json().await.map_err(|e| {
            IntegrationError::new(IntegrationErrorKind::UnexpectedResponse(format!(
                "project response: {e}"
            )))
        })?;
        Ok(project.id)
    }

    /// Submit keywords to a rank-tracking project in batches of 50 with a
    /// 500 ms pause between batches.
    #[instrument(skip(self, keywords), fields(keyword_count = keywords.len()))]
    pub async fn add_tracked_keywords(
        &self,
        project_id: &str,
        keywords: &[String],
    ) -> DrumbeatResult<TrackingBatchReport> {
        let mut batches = 0;
        for (index, batch) in keywords.chunks(TRACKING_BATCH_SIZE).enumerate() {
            if index > 0 {
                tokio::time::sleep(BATCH_DELAY).await;
            }
            self.request(
                Method::POST,
                &format!("/projects/{project_id}/keywords"),
                Some(&json!({ "keywords": batch })),
            )
            .await?;
            batches += 1;
        }
        Ok(TrackingBatchReport {
            submitted: keywords.len(),
            batches,
        })
    }

    /// Current positions for a rank-tracking project.
    #[instrument(skip(self))]
    pub async fn keyword_positions(
        &self,
        project_id: &str,
    ) -> DrumbeatResult<Vec<KeywordPosition>> {
        let response = self
            .request(Method::GET, &format!("/projects/{project_id}/positions"), None)
            .await?;
        response.json().await.map_err(|e| {
            IntegrationError::new(IntegrationErrorKind::UnexpectedResponse(format!(
                "positions response: {e}"
            )))
            .into()
        })
    }
}

#[async_trait]
impl KeywordResearch for KeywordApiClient {
    async fn bulk_research(&self, seeds: &[String]) -> DrumbeatResult<Vec<KeywordMetrics>> {
        KeywordApiClient::bulk_research(self, seeds).await
    }

    async fn competitor_keywords(&self, domain: &str) -> DrumbeatResult<Vec<KeywordMetrics>> {
        KeywordApiClient::competitor_keywords(self, domain).await
    }
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
