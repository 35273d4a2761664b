use http::HeaderMap;
use std::sync::Arc;

use crate::authority::{BackendAuthority, HttpAuthority};
use crate::config::ConnectConfig;
use crate::connection::ConnectionRegistry;
use crate::errors::ConnectError;
use crate::flow::{FlowContextId, FlowStateStore};
use crate::scheduler::{SyncPolicy, SyncScheduler};
use crate::storage::{SharedCacheStore, cache_store_from_env};
use crate::utils::header_set_cookie;

/// Entry point tying the flow, the registry and the authority together.
pub struct SocialConnect {
    config: ConnectConfig,
    authority: Arc<dyn BackendAuthority>,
    flows: FlowStateStore,
    registry: ConnectionRegistry,
}

impl SocialConnect {
    pub fn new(
        config: ConnectConfig,
        authority: Arc<dyn BackendAuthority>,
        cache: SharedCacheStore,
    ) -> Self {
        let flows = FlowStateStore::new(cache, config.flow_state_ttl);
        let registry = ConnectionRegistry::new(authority.clone());
        Self {
            config,
            authority,
            flows,
            registry,
        }
    }

    /// Build everything from the environment: `ORIGIN`, `SOCIAL_*` and
    /// `GENERIC_CACHE_STORE_*`.
    pub async fn from_env() -> Result<Self, ConnectError> {
        let config = ConnectConfig::from_env()?;
        let authority = HttpAuthority::from_env()?;
        let cache = cache_store_from_env().await?;
        Ok(Self::new(config, Arc::new(authority), cache))
    }

    pub fn config(&self) -> &ConnectConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn scheduler(&self, policy: SyncPolicy) -> SyncScheduler {
        SyncScheduler::new(self.registry.clone(), policy)
    }

    pub(crate) fn authority(&self) -> &dyn BackendAuthority {
        self.authority.as_ref()
    }

    pub(crate) fn flows(&self) -> &FlowStateStore {
        &self.flows
    }

    /// Flow context carried by the request, if any.
    pub fn flow_context(&self, headers: &HeaderMap) -> Result<Option<FlowContextId>, ConnectError> {
        FlowContextId::from_headers(headers, &self.config.flow_cookie_name)
    }

    /// Reuse the request's flow context or start a new one. Parallel
    /// attempts for different platforms in one browser share the context.
    pub fn flow_context_or_new(&self, headers: &HeaderMap) -> Result<FlowContextId, ConnectError> {
        match self.flow_context(headers)? {
            Some(ctx) => Ok(ctx),
            None => FlowContextId::generate(),
        }
    }

    /// `Set-Cookie` header carrying `ctx`, living as long as a flow state.
    pub fn flow_cookie_headers(&self, ctx: &FlowContextId) -> Result<HeaderMap, ConnectError> {
        let mut headers = HeaderMap::new();
        let max_age = i64::try_from(self.config.flow_state_ttl).unwrap_or(i64::MAX);
        header_set_cookie(
            &mut headers,
            &self.config.flow_cookie_name,
            ctx.as_str(),
            max_age,
        )?;
        Ok(headers)
    }
}
