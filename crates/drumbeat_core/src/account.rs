//! Account profiles, connectivity health, and stored credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connectivity flag gating automated cycles for an account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccountHealth {
    /// Integrations connected; automation may run
    Active,
    /// OAuth refresh failed; automation is skipped until reconnected
    Disconnected,
    /// A non-auth integration fault was recorded
    Error,
}

/// Basic-auth credentials for an account's CMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CmsCredentials {
    /// Site base URL (e.g. "https://example-dental.com")
    pub site_url: String,
    /// CMS user name
    pub username: String,
    /// Application password
    pub app_password: String,
}

/// One managed client account as the pipelines see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    /// Unique account id
    pub id: Uuid,
    /// Practice or business name
    pub name: String,
    /// Regulatory vertical (e.g. "dental")
    pub vertical: String,
    /// Primary city used in keyword seeds
    pub city: String,
    /// Declared services (e.g. "teeth whitening")
    pub services: Vec<String>,
    /// Competitor domains to analyze
    pub competitors: Vec<String>,
    /// Connectivity flag
    pub health: AccountHealth,
    /// CMS credentials, when the account has a connected site
    pub cms: Option<CmsCredentials>,
}

/// OAuth token set owned by an account.
///
/// Stored encrypted at rest by the token store; mutated only by the token
/// manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Short-lived access token
    pub access_token: String,
    /// Long-lived refresh token
    pub refresh_token: String,
    /// Access-token expiry
    pub expires_at: DateTime<Utc>,
    /// Granted scope
    pub scope: String,
}

impl TokenSet {
    /// Whether the access token expires within `buffer_secs` from now.
    pub fn expires_within(&self, buffer_secs: i64) -> bool {
        self.expires_at <= Utc::now() + chrono::Duration::seconds(buffer_secs)
    }
}
