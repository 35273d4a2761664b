use serde::{Deserialize, Serialize};
use std::fmt;

use crate::platform::Platform;

/// Query sent when asking the authority for a platform authorization URL.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationUrlRequest {
    pub platform: Platform,
    pub redirect_uri: String,
    pub state: String,
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationUrlResponse {
    pub authorization_url: String,
    /// PKCE verifier, present only for platforms that use PKCE.
    #[serde(default)]
    pub code_verifier: Option<String>,
}

impl fmt::Debug for AuthorizationUrlResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationUrlResponse")
            .field("authorization_url", &self.authorization_url)
            .field("code_verifier", &self.code_verifier.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Body of the code exchange call. `redirect_uri` must be the exact value
/// used when the authorization URL was requested.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeExchangeRequest {
    pub platform: Platform,
    pub code: String,
    pub redirect_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_verifier: Option<String>,
}

impl fmt::Debug for CodeExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeExchangeRequest")
            .field("platform", &self.platform)
            .field("code", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("code_verifier", &self.code_verifier.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Error body returned by the authority. Either field may be used.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AuthorityErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
