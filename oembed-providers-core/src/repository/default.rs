//! Host default provider repository
//!
//! Serves the external database alone, in database order, under the host's
//! own cache key.

use async_trait::async_trait;
use oembed_providers_client::ProviderDatabase;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

use super::{fetch_external, find, FetchSettings, ProviderCache, ProviderRepository, DEFAULT_MAX_AGE_SECS};
use crate::cache::{CacheBackend, DEFAULT_PROVIDERS_CACHE_KEY};
use crate::provider::{build_providers, Provider, ProviderMap};
use crate::time::Clock;
use crate::Result;

pub struct DefaultProviderRepository {
    database: Arc<dyn ProviderDatabase>,
    cache: ProviderCache,
    providers_url: RwLock<String>,
}

impl DefaultProviderRepository {
    pub fn new(
        database: Arc<dyn ProviderDatabase>,
        cache: Arc<dyn CacheBackend>,
        clock: Arc<dyn Clock>,
        providers_url: impl Into<String>,
    ) -> Self {
        Self {
            database,
            cache: ProviderCache::new(cache, clock, DEFAULT_PROVIDERS_CACHE_KEY, DEFAULT_MAX_AGE_SECS),
            providers_url: RwLock::new(providers_url.into()),
        }
    }

    #[must_use]
    pub fn with_max_age(mut self, max_age_secs: u64) -> Self {
        self.cache.max_age_secs = max_age_secs;
        self
    }

    async fn rebuild(&self) -> Result<ProviderMap> {
        let url = self.providers_url.read().clone();
        let records = fetch_external(self.database.as_ref(), &url).await?;
        let providers = build_providers(&records);

        self.cache.store(&providers).await?;
        info!(url = %url, providers = providers.len(), "Default oEmbed provider set rebuilt");
        Ok(providers)
    }
}

impl std::fmt::Debug for DefaultProviderRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultProviderRepository")
            .field("providers_url", &*self.providers_url.read())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProviderRepository for DefaultProviderRepository {
    async fn get_all(&self) -> Result<ProviderMap> {
        if let Some(providers) = self.cache.load().await? {
            debug!("Default oEmbed provider set served from cache");
            return Ok(providers);
        }
        self.rebuild().await
    }

    async fn get(&self, name: &str) -> Result<Provider> {
        let providers = self.get_all().await?;
        find(&providers, name)
    }

    async fn invalidate(&self) -> Result<()> {
        self.cache.clear().await
    }

    fn reconfigure(&self, fetch: FetchSettings) {
        *self.providers_url.write() = fetch.providers_url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheBackend;
    use crate::repository::test_support::{entry, StubDatabase};
    use crate::time::ManualClock;
    use crate::Error;

    fn repository(database: Arc<StubDatabase>) -> (DefaultProviderRepository, Arc<MemoryCacheBackend>) {
        let clock = Arc::new(ManualClock::new(0));
        let cache = Arc::new(MemoryCacheBackend::new(10, clock.clone()));
        let repo = DefaultProviderRepository::new(database, cache.clone(), clock, "https://oembed.example.com/providers.json");
        (repo, cache)
    }

    #[tokio::test]
    async fn test_keeps_database_order() {
        let database = Arc::new(StubDatabase::with_entries(vec![
            entry("YouTube", "https://www.youtube.com/"),
            entry("Vimeo", "https://vimeo.com/"),
        ]));
        let (repo, cache) = repository(database.clone());

        let providers = repo.get_all().await.unwrap();

        assert_eq!(providers.keys().collect::<Vec<_>>(), ["YouTube", "Vimeo"]);
        assert!(cache.get(DEFAULT_PROVIDERS_CACHE_KEY).await.unwrap().is_some());
        assert!(cache.get(crate::cache::PROVIDERS_CACHE_KEY).await.unwrap().is_none());

        repo.get_all().await.unwrap();
        assert_eq!(database.calls(), 1);
    }

    #[tokio::test]
    async fn test_get_unknown_provider() {
        let database = Arc::new(StubDatabase::with_entries(vec![entry("Vimeo", "https://vimeo.com/")]));
        let (repo, _) = repository(database);

        assert_eq!(repo.get("vimeo").await.unwrap().name(), "Vimeo");
        assert!(matches!(repo.get("Acme").await, Err(Error::NotFound(name)) if name == "Acme"));
    }

    #[tokio::test]
    async fn test_reconfigure_changes_url() {
        let database = Arc::new(StubDatabase::with_entries(vec![entry("Vimeo", "https://vimeo.com/")]));
        let (repo, _) = repository(database.clone());

        repo.get_all().await.unwrap();
        repo.reconfigure(FetchSettings {
            providers_url: "https://mirror.example.com/providers.json".to_string(),
            external_fetch: true,
        });
        repo.invalidate().await.unwrap();
        repo.get_all().await.unwrap();

        assert_eq!(
            database.urls(),
            [
                "https://oembed.example.com/providers.json",
                "https://mirror.example.com/providers.json"
            ]
        );
    }
}
