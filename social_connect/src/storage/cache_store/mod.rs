mod config;
mod memory;
mod redis;
mod types;

pub use config::{SharedCacheStore, cache_store_from_env, in_memory_cache_store, shared_cache_store};
pub use types::CacheStore;
