use chrono::Utc;

use crate::errors::ConnectError;
use crate::platform::Platform;
use crate::storage::{CacheData, CacheKey, CachePrefix, SharedCacheStore};
use crate::utils::sha256_base64url;

use super::types::{FlowContextId, FlowState};

/// Short-lived, read-once storage of in-flight authorization attempts,
/// scoped by browser context and platform.
///
/// Each attempt also has a nonce index entry pointing back at its platform,
/// so a callback that arrives on the wrong platform can still find and burn
/// the attempt it belongs to.
#[derive(Clone)]
pub struct FlowStateStore {
    cache: SharedCacheStore,
    ttl: u64,
}

impl FlowStateStore {
    pub fn new(cache: SharedCacheStore, ttl: u64) -> Self {
        Self { cache, ttl }
    }

    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    /// Store `state`, replacing any earlier attempt for the same platform in
    /// this context.
    pub async fn put(&self, ctx: &FlowContextId, state: &FlowState) -> Result<(), ConnectError> {
        let slot = slot_key(ctx, state.platform)?;
        let index = nonce_key(ctx, &state.nonce)?;
        let data = state.to_cache_data()?;
        let ttl = usize::try_from(self.ttl).unwrap_or(usize::MAX);

        let mut cache = self.cache.lock().await;
        if let Some(previous) = cache.take(&CachePrefix::flow(), &slot).await? {
            let previous = FlowState::from_cache_data(&previous)?;
            cache
                .take(&CachePrefix::flow(), &nonce_key(ctx, &previous.nonce)?)
                .await?;
            tracing::debug!("Replaced earlier flow state for {}", state.platform);
        }
        cache
            .put_with_ttl(&CachePrefix::flow(), &slot, data, ttl)
            .await?;
        cache
            .put_with_ttl(
                &CachePrefix::flow(),
                &index,
                CacheData {
                    value: state.platform.as_str().to_string(),
                },
                ttl,
            )
            .await?;

        tracing::debug!("Stored flow state for {}", state.platform);
        Ok(())
    }

    /// Remove and return the attempt for `platform`. The entry is gone after
    /// this call whether or not it was still valid.
    pub async fn take(
        &self,
        ctx: &FlowContextId,
        platform: Platform,
    ) -> Result<Option<FlowState>, ConnectError> {
        let mut cache = self.cache.lock().await;
        let Some(data) = cache.take(&CachePrefix::flow(), &slot_key(ctx, platform)?).await? else {
            tracing::debug!("No flow state for {}", platform);
            return Ok(None);
        };

        let state = FlowState::from_cache_data(&data)?;
        cache
            .take(&CachePrefix::flow(), &nonce_key(ctx, &state.nonce)?)
            .await?;
        Ok(live(state))
    }

    /// Remove and return the attempt of this context that issued `nonce`,
    /// whatever its platform.
    pub async fn take_by_nonce(
        &self,
        ctx: &FlowContextId,
        nonce: &str,
    ) -> Result<Option<FlowState>, ConnectError> {
        let mut cache = self.cache.lock().await;
        let Some(index) = cache.take(&CachePrefix::flow(), &nonce_key(ctx, nonce)?).await? else {
            return Ok(None);
        };
        let Ok(platform) = index.value.parse::<Platform>() else {
            tracing::warn!("Dropping flow index entry with unknown platform");
            return Ok(None);
        };

        let slot = slot_key(ctx, platform)?;
        let Some(data) = cache.take(&CachePrefix::flow(), &slot).await? else {
            return Ok(None);
        };
        let state = FlowState::from_cache_data(&data)?;

        // The index outlived its attempt; leave the newer attempt in place.
        if state.nonce != nonce {
            let ttl = usize::try_from(self.ttl).unwrap_or(usize::MAX);
            cache
                .put_with_ttl(&CachePrefix::flow(), &slot, data, ttl)
                .await?;
            return Ok(None);
        }

        tracing::debug!("Found flow state for {} by nonce", platform);
        Ok(live(state))
    }
}

fn live(state: FlowState) -> Option<FlowState> {
    if state.expires_at <= Utc::now() {
        tracing::debug!("Flow state for {} expired", state.platform);
        return None;
    }
    Some(state)
}

/// The raw context id never reaches the cache backend.
fn slot_key(ctx: &FlowContextId, platform: Platform) -> Result<CacheKey, ConnectError> {
    let digest = sha256_base64url(&format!("{}:{}", ctx.as_str(), platform.as_str()))?;
    Ok(CacheKey::new(digest)?)
}

fn nonce_key(ctx: &FlowContextId, nonce: &str) -> Result<CacheKey, ConnectError> {
    let digest = sha256_base64url(&format!("{}:nonce:{}", ctx.as_str(), nonce))?;
    Ok(CacheKey::new(digest)?)
}
