//! Local-business-profile client.
//!
//! Bearer-token auth via the token manager. A 401 gets exactly one retry
//! after a forced token refresh; a second 401 is fatal, as is any 403.

use crate::TokenManager;
use async_trait::async_trait;
use drumbeat_core::{CompletionRequest, SearchPerformanceRow};
use drumbeat_error::{DrumbeatResult, IntegrationError, IntegrationErrorKind};
use drumbeat_interface::{CompletionDriver, SearchPerformanceSource};
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

const DEFAULT_BASE_URL: &str = "https://profiles.googleapis.example/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Search-performance rows are capped server-side at this many.
const SEARCH_PERFORMANCE_ROW_CAP: usize = 500;
/// Hard ceiling on generated review replies.
const REVIEW_REPLY_WORD_LIMIT: usize = 150;

/// Standard profile categories for the managed vertical.
const STANDARD_CATEGORIES: &[&str] = &[
    "Dentist",
    "Cosmetic Dentist",
    "Pediatric Dentist",
    "Orthodontist",
    "Dental Implants Periodontist",
    "Emergency Dental Service",
    "Teeth Whitening Service",
    "Dental Hygienist",
];

/// Topic type of a profile post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TopicType {
    /// General update
    Standard,
    /// Promotion with a redemption window
    Offer,
    /// Dated event
    Event,
}

/// Optional call-to-action button on a profile post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToAction {
    /// Button type (e.g. "BOOK", "CALL", "LEARN_MORE")
    pub action_type: String,
    /// Destination URL
    pub url: String,
}

/// Payload for creating a profile post.
#[derive(Debug, Clone, Serialize)]
pub struct NewProfilePost {
    /// Post body text
    pub body: String,
    /// Topic type
    pub topic_type: TopicType,
    /// Optional call-to-action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_to_action: Option<CallToAction>,
    /// Optional attached media URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

/// A profile post as the provider reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePost {
    /// Provider resource name
    pub name: String,
    /// Lifecycle state (e.g. "LIVE")
    pub state: String,
    /// Topic type
    pub topic_type: TopicType,
    /// Creation timestamp
    pub create_time: String,
}

/// One business location.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Provider resource name
    pub name: String,
    /// Display title
    pub title: String,
    /// Assigned categories
    #[serde(default)]
    pub categories: Vec<String>,
}

/// One customer review.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Provider resource name
    pub name: String,
    /// Star rating, 1-5
    pub rating: u8,
    /// Review text, when the customer left one
    #[serde(default)]
    pub comment: Option<String>,
    /// Reviewer display name
    pub reviewer: String,
    /// Creation timestamp
    pub create_time: String,
}

/// Aggregated insight counters for a location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsightsSummary {
    /// Profile views (maps + search)
    pub views: u64,
    /// Search queries surfacing the profile
    pub searches: u64,
    /// All customer actions
    pub actions: u64,
    /// Phone calls
    pub calls: u64,
    /// Website clicks
    pub website_clicks: u64,
    /// Direction requests
    pub direction_requests: u64,
}

#[derive(Debug, Deserialize)]
struct InsightBucket {
    metric: String,
    #[serde(default)]
    value: u64,
}

/// Client for the local-business-profile API.
pub struct ProfileClient {
    http: Client,
    base_url: String,
    account_id: Uuid,
    tokens: Arc<TokenManager>,
}

impl ProfileClient {
    /// Create a client for an account.
    pub fn new(account_id: Uuid, tokens: Arc<TokenManager>) -> Self {
        Self {
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            account_id,
            tokens,
        }
    }

    /// Override the endpoint (tests, staging).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send one request with bearer auth.
    ///
    /// On 401 the token is force-refreshed and the request retried once;
    /// a second 401, or any 403, is fatal.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&JsonValue>,
    ) -> DrumbeatResult<reqwest::Response> {
        let mut forced_refresh = false;

        loop {
            let token = if forced_refresh {
                self.tokens.force_refresh(self.account_id).await?
            } else {
                self.tokens.refresh_if_needed(self.account_id).await?
            };

            let url = format!("{}{}", self.base_url, path);
            let mut builder = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&token.access_token);
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(|e| {
                IntegrationError::new(IntegrationErrorKind::Unreachable(e.to_string()))
            })?;

            match response.status() {
                StatusCode::UNAUTHORIZED if !forced_refresh => {
                    debug!(path, "Provider rejected token, forcing one refresh");
                    forced_refresh = true;
                }
                StatusCode::UNAUTHORIZED => {
                    return Err(IntegrationError::new(IntegrationErrorKind::AccessDenied(
                        "authorization rejected after token refresh".to_string(),
                    ))
                    .into());
                }
                StatusCode::FORBIDDEN => {
                    return Err(IntegrationError::new(IntegrationErrorKind::AccessDenied(
                        path.to_string(),
                    ))
                    .into());
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

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> DrumbeatResult<T> {
        response.json().await.map_err(|e| {
            IntegrationError::new(IntegrationErrorKind::UnexpectedResponse(format!(
                "{what}: {e}"
            )))
            .into()
        })
    }

    /// Locations attached to the account.
    #[instrument(skip(self))]
    pub async fn list_locations(&self) -> DrumbeatResult<Vec<Location>> {
        let response = self.request(Method::GET, "/locations", None).await?;
        Self::parse(response, "locations response").await
    }

    /// Create a post on a location's profile.
    #[instrument(skip(self, post), fields(topic_type = %post.topic_type))]
    pub async fn create_post(
        &self,
        location: &str,
        post: &NewProfilePost,
    ) -> DrumbeatResult<ProfilePost> {
        let body = serde_json::to_value(post).unwrap_or(JsonValue::Null);
        let response = self
            .request(Method::POST, &format!("/{location}/posts"), Some(&body))
            .await?;
        Self::parse(response, "post response").await
    }

    /// Reviews on a location, newest first.
    #[instrument(skip(self))]
    pub async fn list_reviews(&self, location: &str) -> DrumbeatResult<Vec<Review>> {
        let response = self
            .request(Method::GET, &format!("/{location}/reviews"), None)
            .await?;
        Self::parse(response, "reviews response").await
    }

    /// Generate a bounded-length reply to a review.
    ///
    /// Tone branches on rating: four stars and up gets a grateful,
    /// positive reply; below that, empathetic and non-committal. The reply
    /// never discloses treatment details or other protected information,
    /// and is clipped to 150 words.
    #[instrument(skip(self, driver, review), fields(rating = review.rating))]
    pub async fn suggest_review_reply(
        &self,
        review: &Review,
        driver: &dyn CompletionDriver,
    ) -> DrumbeatResult<String> {
        let tone = if review.rating >= 4 {
            "grateful and positive; thank them warmly for the kind words"
        } else {
            "empathetic and non-committal; acknowledge the frustration, invite them to \
             contact the office directly, and do not admit fault or promise remedies"
        };

        let system = format!(
            "You write replies to public reviews for a healthcare practice. Tone: {tone}. \
             Never mention or imply any treatment, appointment, diagnosis, or other detail \
             about the reviewer; that is protected information even when the reviewer \
             volunteers it. Stay under {REVIEW_REPLY_WORD_LIMIT} words. Output only the reply text."
        );
        let user = format!(
            "Reviewer: {}\nRating: {}/5\nReview: {}",
            review.reviewer,
            review.rating,
            review.comment.as_deref().unwrap_or("(no text)")
        );

        let response = driver
            .complete(&CompletionRequest::from_prompt(system, user))
            .await?;

        let words: Vec<&str> = response.text.split_whitespace().collect();
        let reply = if words.len() > REVIEW_REPLY_WORD_LIMIT {
            words[..REVIEW_REPLY_WORD_LIMIT].join(" ")
        } else {
            words.join(" ")
        };
        Ok(reply)
    }

    /// Aggregate insight counters for a location.
    #[instrument(skip(self))]
    pub async fn fetch_insights(&self, location: &str) -> DrumbeatResult<InsightsSummary> {
        let response = self
            .request(Method::GET, &format!("/{location}/insights"), None)
            .await?;
        let buckets: Vec<InsightBucket> = Self::parse(response, "insights response").await?;

        let mut summary = InsightsSummary::default();
        for bucket in buckets {
            match bucket.metric.as_str() {
                "VIEWS_MAPS" | "VIEWS_SEARCH" => summary.views += bucket.value,
                "QUERIES_DIRECT" | "QUERIES_INDIRECT" => summary.searches += bucket.value,
                "ACTIONS_PHONE" => {
                    summary.calls += bucket.value;
                    summary.actions += bucket.value;
                }
                "ACTIONS_WEBSITE" => {
                    summary.website_clicks += bucket.value;
                    summary.actions += bucket.value;
                }
                "ACTIONS_DRIVING_DIRECTIONS" => {
                    summary.direction_requests += bucket.value;
                    summary.actions += bucket.value;
                }
                other => debug!(metric = other, "Ignoring unrecognized insight metric"),
            }
        }
        Ok(summary)
    }

    /// Standard categories the location has not yet claimed.
    pub fn suggest_categories(&self, current: &[String]) -> Vec<&'static str> {
        let claimed: Vec<String> = current.iter().map(|c| c.to_lowercase()).collect();
        STANDARD_CATEGORIES
            .iter()
            .copied()
            .filter(|candidate| !claimed.contains(&candidate.to_lowercase()))
            .collect()
    }

    /// Top search queries for the trailing window, capped at 500 rows.
    #[instrument(skip(self))]
    pub async fn search_performance(
        &self,
        days: u32,
        limit: usize,
    ) -> DrumbeatResult<Vec<SearchPerformanceRow>> {
        let body = json!({
            "days": days,
            "limit": limit.min(SEARCH_PERFORMANCE_ROW_CAP),
        });
        let response = self
            .request(Method::POST, "/search-performance", Some(&body))
            .await?;
        Self::parse(response, "search performance response").await
    }
}

/// Account-agnostic search-performance source for the pipelines.
///
/// Builds a per-account [`ProfileClient`] on demand, so one instance can
/// serve every account the weekly cycle iterates.
pub struct ProfilePerformanceSource {
    manager: Arc<TokenManager>,
    base_url: Option<String>,
}

impl ProfilePerformanceSource {
    /// Create a source backed by the given token manager.
    pub fn new(manager: Arc<TokenManager>) -> Self {
        Self {
            manager,
            base_url: None,
        }
    }

    /// Override the endpoint (tests, staging).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

#[async_trait]
impl SearchPerformanceSource for ProfilePerformanceSource {
    async fn search_performance(
        &self,
        account_id: Uuid,
        days: u32,
        limit: usize,
    ) -> DrumbeatResult<Vec<SearchPerformanceRow>> {
        let mut client = ProfileClient::new(account_id, Arc::clone(&self.manager));
        if let Some(base_url) = &self.base_url {
            client = client.with_base_url(base_url.clone());
        }
        client.search_performance(days, limit).await
    }
}
