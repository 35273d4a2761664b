mod cache_store;
mod errors;
mod types;

pub use cache_store::{
    CacheStore, SharedCacheStore, cache_store_from_env, in_memory_cache_store, shared_cache_store,
};
pub use errors::StorageError;
pub use types::{CacheData, CacheKey, CachePrefix};
