//! Central configuration for the social_connect crate

use std::env;
use std::sync::LazyLock;
use url::Url;

use crate::errors::ConnectError;
use crate::platform::Platform;

/// Route prefix under which the connection endpoints are mounted.
///
/// The callback route is `{SOCIAL_ROUTE_PREFIX}/callback/{platform}` and must
/// be registered as the redirect URI with every platform.
/// Default: "/auth"
pub static SOCIAL_ROUTE_PREFIX: LazyLock<String> = LazyLock::new(|| {
    env::var("SOCIAL_ROUTE_PREFIX").unwrap_or_else(|_| DEFAULT_ROUTE_PREFIX.to_string())
});

/// Lifetime of an in-flight authorization attempt, in seconds.
/// Default: 600
pub static SOCIAL_FLOW_STATE_TTL: LazyLock<u64> = LazyLock::new(|| {
    env::var("SOCIAL_FLOW_STATE_TTL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_FLOW_STATE_TTL)
});

// "__Host-" prefix makes the cookie host-only.
pub static SOCIAL_FLOW_COOKIE_NAME: LazyLock<String> = LazyLock::new(|| {
    env::var("SOCIAL_FLOW_COOKIE_NAME").unwrap_or_else(|_| DEFAULT_FLOW_COOKIE_NAME.to_string())
});

const DEFAULT_ROUTE_PREFIX: &str = "/auth";
const DEFAULT_FLOW_STATE_TTL: u64 = 600;
const DEFAULT_FLOW_COOKIE_NAME: &str = "__Host-SocialFlow";

/// Settings needed to run connection flows.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    origin: String,
    route_prefix: String,
    pub flow_state_ttl: u64,
    pub flow_cookie_name: String,
}

impl ConnectConfig {
    /// Configuration for an application served from `origin`
    /// (scheme, host and optional port; no path).
    pub fn new(origin: &str) -> Result<Self, ConnectError> {
        Ok(Self {
            origin: normalize_origin(origin)?,
            route_prefix: normalize_route_prefix(DEFAULT_ROUTE_PREFIX),
            flow_state_ttl: DEFAULT_FLOW_STATE_TTL,
            flow_cookie_name: DEFAULT_FLOW_COOKIE_NAME.to_string(),
        })
    }

    /// Read `ORIGIN` and the `SOCIAL_*` variables.
    pub fn from_env() -> Result<Self, ConnectError> {
        let origin = env::var("ORIGIN")
            .map_err(|_| ConnectError::Configuration("ORIGIN must be set".to_string()))?;

        Ok(Self {
            origin: normalize_origin(&origin)?,
            route_prefix: normalize_route_prefix(&SOCIAL_ROUTE_PREFIX),
            flow_state_ttl: *SOCIAL_FLOW_STATE_TTL,
            flow_cookie_name: SOCIAL_FLOW_COOKIE_NAME.to_string(),
        })
    }

    pub fn with_route_prefix(mut self, prefix: &str) -> Self {
        self.route_prefix = normalize_route_prefix(prefix);
        self
    }

    pub fn with_flow_state_ttl(mut self, ttl: u64) -> Self {
        self.flow_state_ttl = ttl;
        self
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    /// Redirect address registered with the platform. Deterministic so the
    /// authorization request and the code exchange always agree on it.
    pub fn callback_uri(&self, platform: Platform) -> String {
        format!(
            "{}{}/callback/{}",
            self.origin,
            self.route_prefix,
            platform.as_str()
        )
    }
}

fn normalize_origin(origin: &str) -> Result<String, ConnectError> {
    let url = Url::parse(origin)
        .map_err(|e| ConnectError::Configuration(format!("Invalid ORIGIN '{origin}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConnectError::Configuration(format!(
            "ORIGIN must use http or https: {origin}"
        )));
    }
    if url.path() != "/" || url.query().is_some() {
        return Err(ConnectError::Configuration(format!(
            "ORIGIN must not contain a path or query: {origin}"
        )));
    }

    Ok(url.origin().ascii_serialization())
}

fn normalize_route_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
