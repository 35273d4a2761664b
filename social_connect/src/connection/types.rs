use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::platform::Platform;

use super::mask::mask_token;

/// A linked platform account as reported by the backend authority.
///
/// Tokens are secrets: they are never serialized back out and their `Debug`
/// output is redacted. Use [`Connection::summary`] for anything user facing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub user_id: String,
    pub platform: Platform,
    pub platform_user_id: String,
    pub platform_username: String,
    pub access_token: SecretString,
    #[serde(default)]
    pub refresh_token: Option<SecretString>,
    #[serde(default)]
    pub token_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub followers_count: Option<u64>,
    #[serde(default)]
    pub profile_url: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    pub fn is_token_expired(&self, now: DateTime<Utc>) -> bool {
        self.token_expires_at.is_some_and(|at| at <= now)
    }

    /// Display metadata is a cache refreshed by sync; it is stale when it
    /// was never synced or not synced within `max_age`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.last_synced_at.is_none_or(|at| now - at >= max_age)
    }

    pub fn summary(&self, now: DateTime<Utc>, max_age: Duration) -> ConnectionSummary {
        ConnectionSummary {
            id: self.id.clone(),
            platform: self.platform,
            platform_user_id: self.platform_user_id.clone(),
            platform_username: self.platform_username.clone(),
            access_token: mask_token(self.access_token.expose_secret()),
            has_refresh_token: self.refresh_token.is_some(),
            token_expires_at: self.token_expires_at,
            token_expired: self.is_token_expired(now),
            followers_count: self.followers_count,
            profile_url: self.profile_url.clone(),
            is_active: self.is_active,
            last_synced_at: self.last_synced_at,
            is_stale: self.is_stale(now, max_age),
        }
    }
}

/// Connection as shown to the user: masked token, staleness flags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummary {
    pub id: String,
    pub platform: Platform,
    pub platform_user_id: String,
    pub platform_username: String,
    pub access_token: String,
    pub has_refresh_token: bool,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub token_expired: bool,
    pub followers_count: Option<u64>,
    pub profile_url: Option<String>,
    pub is_active: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub is_stale: bool,
}

/// A post read through a connection. Metrics are platform specific and
/// passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformPost {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub metrics: Value,
}
