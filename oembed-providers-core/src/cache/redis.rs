//! Shared cache backend (Redis)
//!
//! Items are stored as JSON `{data, expires_at}` under a prefixed key, with a
//! Redis TTL matching the absolute expiry so the server evicts them too.

use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use std::sync::Arc;
use tracing::warn;

use super::{CacheBackend, CacheItem};
use crate::time::Clock;
use crate::{Error, Result};

#[derive(Clone)]
pub struct RedisCacheBackend {
    client: Client,
    key_prefix: String,
    clock: Arc<dyn Clock>,
}

impl RedisCacheBackend {
    /// Create a backend for `redis_url`; no connection is made until first use
    pub fn new(redis_url: &str, key_prefix: impl Into<String>, clock: Arc<dyn Clock>) -> Result<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self {
            client,
            key_prefix: key_prefix.into(),
            clock,
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| Error::Cache(format!("Redis connection failed: {e}")))
    }

    /// Decode a stored wrapper; undecodable or expired entries read as a miss
    fn decode(&self, key: &str, raw: &str) -> Option<CacheItem> {
        let item: CacheItem = match serde_json::from_str(raw) {
            Ok(item) => item,
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding undecodable Redis cache entry");
                return None;
            }
        };
        (!item.is_expired(self.clock.now())).then_some(item)
    }
}

impl std::fmt::Debug for RedisCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheBackend")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<CacheItem>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(self.key(key)).await?;

        Ok(raw.and_then(|raw| self.decode(key, &raw)))
    }

    async fn set(&self, key: &str, data: String, expires_at: Option<i64>) -> Result<()> {
        let item = CacheItem { data, expires_at };
        let json = serde_json::to_string(&item)?;
        let mut conn = self.connection().await?;

        match expires_at {
            Some(expires_at) => {
                let ttl = expires_at - self.clock.now();
                if ttl <= 0 {
                    let _: () = conn.del(self.key(key)).await?;
                    return Ok(());
                }
                let _: () = conn.set_ex(self.key(key), json, ttl.unsigned_abs()).await?;
            }
            None => {
                let _: () = conn.set(self.key(key), json).await?;
            }
        }

        tracing::debug!(key = %key, expires_at = ?expires_at, "Cache entry stored in Redis");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(self.key(key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{ManualClock, SystemClock};

    #[test]
    fn test_keys_are_prefixed() {
        let backend = RedisCacheBackend::new("redis://127.0.0.1:6379", "oembed:", Arc::new(SystemClock)).unwrap();
        assert_eq!(
            backend.key("oembed_providers:oembed_providers"),
            "oembed:oembed_providers:oembed_providers"
        );
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = RedisCacheBackend::new("not-a-redis-url", "oembed:", Arc::new(SystemClock)).unwrap_err();
        assert!(matches!(err, Error::Cache(_)));
    }

    #[test]
    fn test_undecodable_entry_is_a_miss() {
        let backend = RedisCacheBackend::new("redis://127.0.0.1:6379", "oembed:", Arc::new(SystemClock)).unwrap();
        assert!(backend.decode("oembed_providers:oembed_providers", "not json").is_none());
        assert!(backend.decode("oembed_providers:oembed_providers", r#"{"expires_at": 5}"#).is_none());
    }

    #[test]
    fn test_decode_honours_expiry() {
        let clock = Arc::new(ManualClock::new(100));
        let backend = RedisCacheBackend::new("redis://127.0.0.1:6379", "oembed:", clock.clone()).unwrap();
        let raw = r#"{"data":"{}","expires_at":100}"#;

        assert_eq!(backend.decode("k", raw).map(|item| item.data), Some("{}".to_string()));
        clock.advance(1);
        assert!(backend.decode("k", raw).is_none());
    }
}
