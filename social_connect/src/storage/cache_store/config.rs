use std::{env, sync::Arc, sync::LazyLock};
use tokio::sync::Mutex;

use crate::storage::errors::StorageError;

use super::types::{CacheStore, InMemoryCacheStore, RedisCacheStore};

/// A cache store shared between request handlers.
pub type SharedCacheStore = Arc<Mutex<Box<dyn CacheStore>>>;

pub(crate) static GENERIC_CACHE_STORE_TYPE: LazyLock<String> = LazyLock::new(|| {
    env::var("GENERIC_CACHE_STORE_TYPE").unwrap_or_else(|_| "memory".to_string())
});

pub(crate) static GENERIC_CACHE_STORE_URL: LazyLock<String> =
    LazyLock::new(|| env::var("GENERIC_CACHE_STORE_URL").unwrap_or_default());

/// Wrap any store so it can be shared.
pub fn shared_cache_store(store: impl CacheStore) -> SharedCacheStore {
    Arc::new(Mutex::new(Box::new(store)))
}

/// In-memory store, suitable for single-process deployments and tests.
pub fn in_memory_cache_store() -> SharedCacheStore {
    shared_cache_store(InMemoryCacheStore::new())
}

/// Build the store selected by `GENERIC_CACHE_STORE_TYPE` (`memory` or
/// `redis`), verifying the connection for redis.
pub async fn cache_store_from_env() -> Result<SharedCacheStore, StorageError> {
    open_cache_store(
        GENERIC_CACHE_STORE_TYPE.as_str(),
        GENERIC_CACHE_STORE_URL.as_str(),
    )
    .await
}

pub(crate) async fn open_cache_store(
    store_type: &str,
    store_url: &str,
) -> Result<SharedCacheStore, StorageError> {
    tracing::info!("Initializing cache store with type: {}", store_type);

    let store: Box<dyn CacheStore> = match store_type {
        "memory" => Box::new(InMemoryCacheStore::new()),
        "redis" => {
            let store = RedisCacheStore::open(store_url).inspect_err(|e| {
                tracing::error!("Failed to create Redis client: {}", e);
            })?;
            store.init().await.inspect_err(|e| {
                tracing::error!("Failed to connect to Redis: {}", e);
            })?;
            Box::new(store)
        }
        t => {
            return Err(StorageError::InvalidInput(format!(
                "Unsupported cache store type: {t}. Supported types are 'memory' and 'redis'"
            )));
        }
    };

    tracing::info!("Connected to cache store: type={}", store_type);

    Ok(Arc::new(Mutex::new(store)))
}
