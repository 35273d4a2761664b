//! social_connect - linking user accounts to social media platforms
//!
//! Runs the OAuth2 authorization-code flow against a backend authority that
//! holds the platform credentials, and manages the resulting connections:
//! listing, disconnecting, token refresh and metadata sync.

mod authority;
mod config;
mod connection;
mod errors;
mod flow;
mod platform;
mod scheduler;
mod service;
mod session;
mod storage;
mod utils;

#[cfg(test)]
mod test_utils;

pub use authority::{
    AuthorizationUrlRequest, AuthorizationUrlResponse, BackendAuthority, CodeExchangeRequest,
    HttpAuthority, SOCIAL_AUTHORITY_URL, SOCIAL_HTTP_TIMEOUT_SECS,
};
pub use config::{
    ConnectConfig, SOCIAL_FLOW_COOKIE_NAME, SOCIAL_FLOW_STATE_TTL, SOCIAL_ROUTE_PREFIX,
};
pub use connection::{
    Connection, ConnectionRegistry, ConnectionSummary, DEFAULT_STALE_AFTER_SECS, PlatformPost,
    mask_token,
};
pub use errors::{ConnectError, RefreshFailure, Remedy};
pub use flow::{CallbackParams, FlowContextId, FlowState, FlowStateStore};
pub use platform::{Platform, UnknownPlatform};
pub use scheduler::{MaintenanceReport, SyncPolicy, SyncScheduler};
pub use service::SocialConnect;
pub use session::SessionUser;
pub use storage::{
    CacheData, CacheKey, CachePrefix, CacheStore, SharedCacheStore, StorageError,
    cache_store_from_env, in_memory_cache_store, shared_cache_store,
};
pub use utils::UtilError;

/// Build a [`SocialConnect`] from the environment.
///
/// Reads `ORIGIN`, `SOCIAL_AUTHORITY_URL` and the optional `SOCIAL_*` and
/// `GENERIC_CACHE_STORE_*` settings, and connects the cache store.
pub async fn init() -> Result<SocialConnect, ConnectError> {
    let service = SocialConnect::from_env().await?;
    tracing::info!(
        "Social connections ready at {}{}",
        service.config().origin(),
        service.config().route_prefix()
    );
    Ok(service)
}
