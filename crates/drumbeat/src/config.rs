//! Process configuration.
//!
//! Sources in order of precedence: `DRUMBEAT_*` environment variables,
//! then an optional `drumbeat.toml` in the working directory. A `.env`
//! file is loaded first so either source can come from it.

use config::{Config, Environment, File};
use drumbeat_error::{ConfigError, DrumbeatResult};
use drumbeat_integrations::OAuthConfig;
use serde::Deserialize;
use tracing::{debug, instrument};

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

/// Completion-service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicSettings {
    /// API key
    pub api_key: String,
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
}

/// Keyword-research API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordApiSettings {
    /// API key
    pub api_key: String,
    /// Endpoint override (tests, staging)
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Business-profile OAuth settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthSettings {
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
    /// Profile API endpoint override (tests, staging)
    #[serde(default)]
    pub profile_base_url: Option<String>,
}

impl From<OAuthSettings> for OAuthConfig {
    fn from(settings: OAuthSettings) -> Self {
        OAuthConfig {
            token_endpoint: settings.token_endpoint,
            revoke_endpoint: settings.revoke_endpoint,
            client_id: settings.client_id,
            client_secret: settings.client_secret,
            redirect_uri: settings.redirect_uri,
        }
    }
}

/// Top-level configuration for a Drumbeat process.
#[derive(Debug, Clone, Deserialize)]
pub struct DrumbeatConfig {
    /// Completion service
    pub anthropic: AnthropicSettings,
    /// Keyword-research API
    pub keyword_api: KeywordApiSettings,
    /// Business-profile OAuth
    pub oauth: OAuthSettings,
}

impl DrumbeatConfig {
    /// Load configuration from `drumbeat.toml` and `DRUMBEAT_*` variables.
    ///
    /// Nested fields use a double underscore in the environment, e.g.
    /// `DRUMBEAT_ANTHROPIC__API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a source fails to parse or a
    /// required field is missing from every source.
    #[instrument]
    pub fn load() -> DrumbeatResult<Self> {
        dotenvy::dotenv().ok();
        debug!("Loading configuration");

        Config::builder()
            .add_source(File::with_name("drumbeat").required(false))
            .add_source(Environment::with_prefix("DRUMBEAT").separator("__"))
            .build()
            .map_err(|e| ConfigError::new(format!("failed to build configuration: {e}")))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("failed to parse configuration: {e}")).into())
    }

    /// Load configuration from a specific TOML file, without environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> DrumbeatResult<Self> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                ConfigError::new(format!(
                    "failed to read configuration from {}: {e}",
                    path.as_ref().display()
                ))
            })?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("failed to parse configuration: {e}")).into())
    }
}
