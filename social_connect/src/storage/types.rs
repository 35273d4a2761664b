use serde::{Deserialize, Serialize};

use super::errors::StorageError;

/// Data stored in the cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheData {
    pub value: String,
}

/// Namespace for a group of cache entries, e.g. `flow`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePrefix(String);

/// Key of a single cache entry within a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey(String);

const MAX_PART_LEN: usize = 256;

fn validate_part(kind: &str, value: &str) -> Result<(), StorageError> {
    if value.is_empty() {
        return Err(StorageError::InvalidInput(format!("{kind} cannot be empty")));
    }
    if value.len() > MAX_PART_LEN {
        return Err(StorageError::InvalidInput(format!(
            "{kind} exceeds {MAX_PART_LEN} bytes"
        )));
    }
    // ':' separates prefix and key in backend keys; whitespace and control
    // characters have no business in a cache key.
    if value
        .chars()
        .any(|c| c == ':' || c.is_whitespace() || c.is_control())
    {
        return Err(StorageError::InvalidInput(format!(
            "{kind} contains forbidden characters"
        )));
    }
    Ok(())
}

impl CachePrefix {
    pub fn new(prefix: impl Into<String>) -> Result<Self, StorageError> {
        let prefix = prefix.into();
        validate_part("Cache prefix", &prefix)?;
        Ok(Self(prefix))
    }

    /// Prefix for in-flight authorization attempts.
    pub fn flow() -> Self {
        Self("flow".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();
        validate_part("Cache key", &key)?;
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
