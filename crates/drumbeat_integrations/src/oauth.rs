//! OAuth token lifecycle manager.
//!
//! Owns every mutation of an account's stored token set: refresh with an
//! expiry buffer, authorization-code exchange, and revocation. Refresh
//! failure flips the account's connectivity flag to disconnected and is
//! fatal to the caller's current operation.

use chrono::{Duration as ChronoDuration, Utc};
use drumbeat_core::{AccountHealth, TokenSet};
use drumbeat_error::{DrumbeatResult, IntegrationError, IntegrationErrorKind};
use drumbeat_interface::{AccountStore, TokenStore};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Tokens expiring within this window are refreshed before use.
const REFRESH_BUFFER_SECS: i64 = 5 * 60;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Provider endpoints and client credentials for the OAuth flows.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Token endpoint for code exchange and refresh
    pub token_endpoint: String,
    /// Revocation endpoint
    pub revoke_endpoint: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Registered redirect URI
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Manages the OAuth token lifecycle for all accounts.
pub struct TokenManager {
    http: Client,
    config: OAuthConfig,
    tokens: Arc<dyn TokenStore>,
    accounts: Arc<dyn AccountStore>,
}

impl TokenManager {
    /// Create a manager over the given stores.
    pub fn new(
        config: OAuthConfig,
        tokens: Arc<dyn TokenStore>,
        accounts: Arc<dyn AccountStore>,
    ) -> Self {
        Self {
            http: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            config,
            tokens,
            accounts,
        }
    }

    /// Return a usable access token, refreshing first when the stored one
    /// expires within five minutes.
    #[instrument(skip(self))]
    pub async fn refresh_if_needed(&self, account_id: Uuid) -> DrumbeatResult<TokenSet> {
        let stored = self.load_required(account_id).await?;
        if !stored.expires_within(REFRESH_BUFFER_SECS) {
            debug!("Stored token still fresh, reusing");
            return Ok(stored);
        }
        self.refresh(account_id, stored).await
    }

    /// Refresh regardless of expiry. Used after a provider rejects a token
    /// that looked fresh locally.
    #[instrument(skip(self))]
    pub async fn force_refresh(&self, account_id: Uuid) -> DrumbeatResult<TokenSet> {
        let stored = self.load_required(account_id).await?;
        self.refresh(account_id, stored).await
    }

    /// Exchange an authorization code for a token set and persist it.
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, account_id: Uuid, code: &str) -> DrumbeatResult<TokenSet> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        let parsed = self.token_request(&params).await.map_err(|e| {
            IntegrationError::new(IntegrationErrorKind::TokenRefreshFailed(format!(
                "code exchange: {e}"
            )))
        })?;

        let tokens = TokenSet {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token.unwrap_or_default(),
            expires_at: Utc::now() + ChronoDuration::seconds(parsed.expires_in),
            scope: parsed.scope.unwrap_or_default(),
        };
        self.tokens.save(account_id, tokens.clone()).await?;
        Ok(tokens)
    }

    /// Best-effort provider revocation, then clear stored tokens locally.
    ///
    /// Provider failure is ignored; the local clear always happens.
    #[instrument(skip(self))]
    pub async fn revoke(&self, account_id: Uuid) -> DrumbeatResult<()> {
        if let Some(stored) = self.tokens.load(account_id).await? {
            let result = self
                .http
                .post(&self.config.revoke_endpoint)
                .form(&[("token", stored.access_token.as_str())])
                .send()
                .await;
            if let Err(e) = result {
                warn!(error = %e, "Provider revoke failed, clearing local tokens anyway");
            }
        }
        self.tokens.clear(account_id).await
    }

    async fn load_required(&self, account_id: Uuid) -> DrumbeatResult<TokenSet> {
        self.tokens.load(account_id).await?.ok_or_else(|| {
            IntegrationError::new(IntegrationErrorKind::TokensMissing(account_id.to_string()))
                .into()
        })
    }

    /// Perform the refresh-token exchange and persist the result.
    ///
    /// The refresh token and scope are retained unless the provider sends
    /// replacements. Failure disconnects the account.
    async fn refresh(&self, account_id: Uuid, stored: TokenSet) -> DrumbeatResult<TokenSet> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", stored.refresh_token.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let parsed = match self.token_request(&params).await {
            Ok(parsed) => parsed,
            Err(message) => {
                warn!(%account_id, error = %message, "Token refresh failed, disconnecting account");
                if let Err(e) = self
                    .accounts
                    .set_health(account_id, AccountHealth::Disconnected)
                    .await
                {
                    warn!(error = %e, "Failed to flag account as disconnected");
                }
                return Err(IntegrationError::new(
                    IntegrationErrorKind::TokenRefreshFailed(message),
                )
                .into());
            }
        };

        let refreshed = TokenSet {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token.unwrap_or(stored.refresh_token),
            expires_at: Utc::now() + ChronoDuration::seconds(parsed.expires_in),
            scope: parsed.scope.unwrap_or(stored.scope),
        };
        self.tokens.save(account_id, refreshed.clone()).await?;
        debug!(%account_id, "Token refreshed and persisted");
        Ok(refreshed)
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
    ) -> Result<TokenEndpointResponse, String> {
        let response = self
            .http
            .post(&self.config.token_endpoint)
            .form(params)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("token endpoint returned {status}: {body}"));
        }
        response.json().await.map_err(|e| e.to_string())
    }
}
