//! In-process cache backend (Moka)

use async_trait::async_trait;
use std::sync::Arc;

use super::{CacheBackend, CacheItem};
use crate::time::Clock;
use crate::Result;

/// Moka-backed cache, local to the process
#[derive(Clone)]
pub struct MemoryCacheBackend {
    entries: moka::future::Cache<String, CacheItem>,
    clock: Arc<dyn Clock>,
}

impl MemoryCacheBackend {
    #[must_use]
    pub fn new(max_capacity: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: moka::future::CacheBuilder::new(max_capacity).build(),
            clock,
        }
    }
}

impl std::fmt::Debug for MemoryCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheBackend")
            .field("entries", &self.entries.entry_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<CacheItem>> {
        let Some(item) = self.entries.get(key).await else {
            return Ok(None);
        };

        if item.is_expired(self.clock.now()) {
            self.entries.invalidate(key).await;
            tracing::debug!(key = %key, "Cache entry expired");
            return Ok(None);
        }

        Ok(Some(item))
    }

    async fn set(&self, key: &str, data: String, expires_at: Option<i64>) -> Result<()> {
        self.entries
            .insert(key.to_string(), CacheItem { data, expires_at })
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.invalidate(key).await;
        Ok(())
    }
}
