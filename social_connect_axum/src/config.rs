//! Settings for the pages served by this crate

use std::sync::LazyLock;

/// Where the callback page sends the browser once it is done.
/// Default: "/"
pub static SOCIAL_MANAGE_URL: LazyLock<String> =
    LazyLock::new(|| std::env::var("SOCIAL_MANAGE_URL").unwrap_or_else(|_| "/".to_string()));

/// Delay before leaving the callback page after a success, in milliseconds.
/// Default: 2000
pub static SOCIAL_CALLBACK_SUCCESS_DELAY_MS: LazyLock<u64> =
    LazyLock::new(|| delay_from_env("SOCIAL_CALLBACK_SUCCESS_DELAY_MS", 2000));

/// Delay before leaving the callback page after a failure, in milliseconds.
/// Default: 4000
pub static SOCIAL_CALLBACK_ERROR_DELAY_MS: LazyLock<u64> =
    LazyLock::new(|| delay_from_env("SOCIAL_CALLBACK_ERROR_DELAY_MS", 4000));

fn delay_from_env(name: &str, default: u64) -> u64 {
    parse_delay(std::env::var(name).ok().as_deref(), default)
}

fn parse_delay(value: Option<&str>, default: u64) -> u64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct PageConfig {
    pub manage_url: String,
    pub success_delay_ms: u64,
    pub error_delay_ms: u64,
}

impl PageConfig {
    pub fn from_env() -> Self {
        Self {
            manage_url: SOCIAL_MANAGE_URL.clone(),
            success_delay_ms: *SOCIAL_CALLBACK_SUCCESS_DELAY_MS,
            error_delay_ms: *SOCIAL_CALLBACK_ERROR_DELAY_MS,
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            manage_url: "/".to_string(),
            success_delay_ms: 2000,
            error_delay_ms: 4000,
        }
    }
}
