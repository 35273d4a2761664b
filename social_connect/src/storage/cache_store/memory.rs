use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::storage::errors::StorageError;
use crate::storage::types::{CacheData, CacheKey, CachePrefix};

use super::types::{CacheStore, InMemoryCacheStore};

const CACHE_PREFIX: &str = "cache";

impl InMemoryCacheStore {
    pub(crate) fn new() -> Self {
        tracing::info!("Creating new in-memory generic cache store");
        Self {
            entry: HashMap::new(),
        }
    }

    fn make_key(prefix: &CachePrefix, key: &CacheKey) -> String {
        format!("{CACHE_PREFIX}:{}:{}", prefix.as_str(), key.as_str())
    }

    fn purge_expired(&mut self) {
        let now = Instant::now();
        self.entry.retain(|_, (_, deadline)| *deadline > now);
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn put_with_ttl(
        &mut self,
        prefix: &CachePrefix,
        key: &CacheKey,
        value: CacheData,
        ttl: usize,
    ) -> Result<(), StorageError> {
        self.purge_expired();
        let deadline = Instant::now() + Duration::from_secs(ttl as u64);
        self.entry
            .insert(Self::make_key(prefix, key), (value, deadline));
        Ok(())
    }

    async fn take(
        &mut self,
        prefix: &CachePrefix,
        key: &CacheKey,
    ) -> Result<Option<CacheData>, StorageError> {
        let now = Instant::now();
        Ok(self
            .entry
            .remove(&Self::make_key(prefix, key))
            .filter(|(_, deadline)| *deadline > now)
            .map(|(value, _)| value))
    }
}
