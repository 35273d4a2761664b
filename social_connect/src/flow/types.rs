use chrono::{DateTime, Utc};
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ConnectError;
use crate::platform::Platform;
use crate::storage::{CacheData, StorageError};
use crate::utils::{gen_random_string, get_cookie_from_headers};

/// Identifies one browser context across the redirect round trip.
///
/// Carried in the flow cookie. It only scopes flow state lookups and grants
/// nothing on its own.
#[derive(Clone, PartialEq, Eq)]
pub struct FlowContextId(String);

impl FlowContextId {
    pub fn generate() -> Result<Self, ConnectError> {
        Ok(Self(gen_random_string(32)?))
    }

    /// Read the id from the request cookies, if present and well formed.
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Result<Option<Self>, ConnectError> {
        let value = get_cookie_from_headers(headers, cookie_name)?;
        Ok(value.and_then(Self::parse))
    }

    fn parse(value: &str) -> Option<Self> {
        let valid = !value.is_empty()
            && value.len() <= 128
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if valid {
            Some(Self(value.to_string()))
        } else {
            tracing::debug!("Ignoring malformed flow context cookie");
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FlowContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FlowContextId([REDACTED])")
    }
}

/// One in-flight authorization attempt.
#[derive(Clone, Serialize, Deserialize)]
pub struct FlowState {
    pub nonce: String,
    pub platform: Platform,
    pub code_verifier: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl FlowState {
    pub(crate) fn to_cache_data(&self) -> Result<CacheData, StorageError> {
        Ok(CacheData {
            value: serde_json::to_string(self)?,
        })
    }

    pub(crate) fn from_cache_data(data: &CacheData) -> Result<Self, StorageError> {
        Ok(serde_json::from_str(&data.value)?)
    }
}

impl fmt::Debug for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowState")
            .field("nonce", &"[REDACTED]")
            .field("platform", &self.platform)
            .field("code_verifier", &self.code_verifier.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Query parameters the platform appends to the redirect address.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}
