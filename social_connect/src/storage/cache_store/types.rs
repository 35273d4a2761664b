use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Instant;

use crate::storage::errors::StorageError;
use crate::storage::types::{CacheData, CacheKey, CachePrefix};

pub(crate) struct InMemoryCacheStore {
    pub(super) entry: HashMap<String, (CacheData, Instant)>,
}

pub(crate) struct RedisCacheStore {
    pub(super) client: redis::Client,
}

/// Key-value backend for short-lived data.
///
/// Implementations must honor the TTL passed to `put_with_ttl` and must make
/// `take` atomic: two concurrent `take` calls for the same key return the
/// value to at most one of them.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Initialize the store. This is called when the store is created.
    async fn init(&self) -> Result<(), StorageError>;

    /// Put a value into the store, replacing any previous value, expiring
    /// after `ttl` seconds.
    async fn put_with_ttl(
        &mut self,
        prefix: &CachePrefix,
        key: &CacheKey,
        value: CacheData,
        ttl: usize,
    ) -> Result<(), StorageError>;

    /// Atomically get a value and delete it.
    async fn take(
        &mut self,
        prefix: &CachePrefix,
        key: &CacheKey,
    ) -> Result<Option<CacheData>, StorageError>;
}
