//! Cache backend capability
//!
//! Point operations on a key-value store with absolute expiry. Values are
//! serialized JSON so any store (in-memory, Redis) can hold them.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

use crate::Result;

/// A stored value and its expiry (Unix seconds, `None` = permanent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheItem {
    pub data: String,
    pub expires_at: Option<i64>,
}

impl CacheItem {
    /// An item stays valid through its expiry second
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch a live item; expired items are reported as absent
    async fn get(&self, key: &str) -> Result<Option<CacheItem>>;

    /// Store `data`, replacing whatever was there
    async fn set(&self, key: &str, data: String, expires_at: Option<i64>) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// Read and decode a JSON value; undecodable entries count as misses
pub async fn get_json<T: DeserializeOwned>(backend: &dyn CacheBackend, key: &str) -> Result<Option<T>> {
    let Some(item) = backend.get(key).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&item.data) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key = %key, error = %e, "Discarding undecodable cache entry");
            Ok(None)
        }
    }
}

/// Encode and store a JSON value
pub async fn set_json<T: Serialize + Sync>(
    backend: &dyn CacheBackend,
    key: &str,
    value: &T,
    expires_at: Option<i64>,
) -> Result<()> {
    let data = serde_json::to_string(value)?;
    backend.set(key, data, expires_at).await
}
