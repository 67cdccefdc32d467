//! Content-management publishing client.
//!
//! Speaks the CMS REST surface with Basic-style credential encoding.
//! Unpublish is a status transition back to draft, never a delete; that
//! transition is the rollback mechanism.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use drumbeat_core::{AccountProfile, CmsCredentials, ContentPiece};
use drumbeat_error::{DrumbeatResult, IntegrationError, IntegrationErrorKind};
use drumbeat_interface::{ContentPublisher, PublishedPost};
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const POSTS_PATH: &str = "/wp-json/wp/v2/posts";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Publication status of a CMS post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CmsPostStatus {
    /// Live
    Publish,
    /// Unpublished / rolled back
    Draft,
    /// Awaiting CMS-side review
    Pending,
}

/// Payload for creating a post.
#[derive(Debug, Clone, Serialize)]
pub struct NewCmsPost {
    /// Post title
    pub title: String,
    /// Rendered HTML content
    pub content: String,
    /// Publication status
    pub status: CmsPostStatus,
    /// URL slug
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Excerpt shown in archives
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// SEO meta fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

/// Partial-update payload.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateCmsPost {
    /// New title, when changing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New content, when changing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// New status, when changing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CmsPostStatus>,
}

/// A post as the CMS reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct CmsPost {
    /// Provider post id
    pub id: u64,
    /// Public URL
    pub link: String,
    /// Publication status
    pub status: CmsPostStatus,
    /// Post title
    pub title: String,
    /// Rendered HTML content
    pub content: String,
}

/// Capability probe result.
#[derive(Debug, Clone, Deserialize)]
pub struct CmsInfo {
    /// Site name
    pub name: String,
    /// Site URL as the CMS reports it
    pub url: String,
}

/// Client for an account's CMS, authenticated with Basic credentials.
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: Client,
    site_url: String,
    auth_header: String,
}

impl CmsClient {
    /// Create a client for an account's site.
    pub fn new(credentials: &CmsCredentials) -> Self {
        let encoded = BASE64.encode(format!(
            "{}:{}",
            credentials.username, credentials.app_password
        ));
        Self {
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            site_url: credentials.site_url.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {encoded}"),
        }
    }

    async fn request<T: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> DrumbeatResult<reqwest::Response> {
        let url = format!("{}{}", self.site_url, path);
        let mut builder = self
            .http
            .request(method, &url)
            .header(reqwest::header::AUTHORIZATION, &self.auth_header);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            IntegrationError::new(IntegrationErrorKind::Unreachable(e.to_string()))
        })?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                Err(IntegrationError::new(IntegrationErrorKind::CredentialsInvalid).into())
            }
            StatusCode::FORBIDDEN => Err(IntegrationError::new(
                IntegrationErrorKind::InsufficientPermission(path.to_string()),
            )
            .into()),
            StatusCode::NOT_FOUND => Err(IntegrationError::new(
                IntegrationErrorKind::EndpointNotFound(path.to_string()),
            )
            .into()),
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                Err(IntegrationError::new(IntegrationErrorKind::ApiError {
                    status: status.as_u16(),
                    message,
                })
                .into())
            }
            _ => Ok(response),
        }
    }

    async fn parse_post(response: reqwest::Response) -> DrumbeatResult<CmsPost> {
        response.json().await.map_err(|e| {
            IntegrationError::new(IntegrationErrorKind::UnexpectedResponse(format!(
                "post response: {e}"
            )))
            .into()
        })
    }

    /// Probe the REST surface, confirming the endpoint is enabled and the
    /// credentials reach it.
    #[instrument(skip(self))]
    pub async fn probe(&self) -> DrumbeatResult<CmsInfo> {
        let response = self
            .request::<()>(Method::GET, "/wp-json", None)
            .await?;
        response.json().await.map_err(|e| {
            IntegrationError::new(IntegrationErrorKind::UnexpectedResponse(format!(
                "probe response: {e}"
            )))
            .into()
        })
    }

    /// Create a post.
    #[instrument(skip(self, post), fields(title = %post.title, status = %post.status))]
    pub async fn create_post(&self, post: &NewCmsPost) -> DrumbeatResult<CmsPost> {
        let response = self.request(Method::POST, POSTS_PATH, Some(post)).await?;
        let created = Self::parse_post(response).await?;
        debug!(post_id = created.id, "Created CMS post");
        Ok(created)
    }

    /// Update a post.
    #[instrument(skip(self, update))]
    pub async fn update_post(&self, id: u64, update: &UpdateCmsPost) -> DrumbeatResult<CmsPost> {
        let response = self
            .request(Method::POST, &format!("{POSTS_PATH}/{id}"), Some(update))
            .await?;
        Self::parse_post(response).await
    }

    /// Unpublish a post by transitioning it back to draft.
    ///
    /// This is the rollback mechanism; posts are never deleted.
    #[instrument(skip(self))]
    pub async fn unpublish_post(&self, id: u64) -> DrumbeatResult<CmsPost> {
        self.update_post(
            id,
            &UpdateCmsPost {
                status: Some(CmsPostStatus::Draft),
                ..UpdateCmsPost::default()
            },
        )
        .await
    }
}

/// Stateless publisher building a per-account [`CmsClient`] from the
/// account's stored credentials.
#[derive(Debug, Clone, Default)]
pub struct CmsPublisher;

impl CmsPublisher {
    /// Create a publisher.
    pub fn new() -> Self {
        Self
    }

    fn client_for(account: &AccountProfile) -> DrumbeatResult<CmsClient> {
        let credentials = account.cms.as_ref().ok_or_else(|| {
            IntegrationError::new(IntegrationErrorKind::CredentialsInvalid)
        })?;
        Ok(CmsClient::new(credentials))
    }
}

#[async_trait]
impl ContentPublisher for CmsPublisher {
    async fn publish(
        &self,
        account: &AccountProfile,
        piece: &ContentPiece,
    ) -> DrumbeatResult<PublishedPost> {
        let client = Self::client_for(account)?;
        let post = client
            .create_post(&NewCmsPost {
                title: piece.title.clone(),
                content: piece.body_html.clone(),
                status: CmsPostStatus::Publish,
                slug: None,
                excerpt: None,
                meta: Some(serde_json::json!({
                    "meta_title": piece.meta_title,
                    "meta_description": piece.meta_description,
                })),
            })
            .await?;
        Ok(PublishedPost {
            post_id: post.id,
            url: post.link,
        })
    }

    async fn unpublish(&self, account: &AccountProfile, post_id: u64) -> DrumbeatResult<()> {
        let client = Self::client_for(account)?;
        client.unpublish_post(post_id).await?;
        Ok(())
    }
}
