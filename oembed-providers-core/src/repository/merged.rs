//! Merged provider repository
//!
//! Rebuild on cache miss:
//! 1. Project custom providers into raw records
//! 2. Fetch the external database (when enabled) and merge, custom first
//! 3. Sort by name, case-insensitively and stable
//! 4. Validate each record, dropping failures
//! 5. Cache the set for `max_age_secs`
//!
//! A failed rebuild stores nothing, so a previously cached set stays as is.

use async_trait::async_trait;
use oembed_providers_client::ProviderDatabase;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    fetch_external, find, FetchSettings, LookupMode, ProviderCache, ProviderRepository, RepositoryConfig,
};
use crate::cache::{CacheBackend, PROVIDERS_CACHE_KEY};
use crate::provider::{build_providers, merge, sort_by_name, Provider, ProviderMap};
use crate::storage::CustomProviderStore;
use crate::time::Clock;
use crate::Result;

pub struct MergedProviderRepository {
    custom: Arc<dyn CustomProviderStore>,
    database: Arc<dyn ProviderDatabase>,
    cache: ProviderCache,
    fetch: RwLock<FetchSettings>,
    lookup: LookupMode,
    delegate: Option<Arc<dyn ProviderRepository>>,
}

impl MergedProviderRepository {
    pub fn new(
        custom: Arc<dyn CustomProviderStore>,
        database: Arc<dyn ProviderDatabase>,
        cache: Arc<dyn CacheBackend>,
        clock: Arc<dyn Clock>,
        config: RepositoryConfig,
    ) -> Self {
        Self {
            custom,
            database,
            cache: ProviderCache::new(cache, clock, PROVIDERS_CACHE_KEY, config.max_age_secs),
            fetch: RwLock::new(config.fetch),
            lookup: config.lookup,
            delegate: None,
        }
    }

    /// Repository answering `get(name)` in [`LookupMode::Delegate`]
    #[must_use]
    pub fn with_delegate(mut self, delegate: Arc<dyn ProviderRepository>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Fetch settings used by the next rebuild
    #[must_use]
    pub fn fetch_settings(&self) -> FetchSettings {
        self.fetch.read().clone()
    }

    async fn rebuild(&self) -> Result<ProviderMap> {
        let fetch = self.fetch_settings();

        let custom = self.custom.list().await?;
        let custom_count = custom.len();
        let mut records = if fetch.external_fetch {
            let external = fetch_external(self.database.as_ref(), &fetch.providers_url).await?;
            merge(external, custom)
        } else {
            custom
        };

        sort_by_name(&mut records);
        let providers = build_providers(&records);

        self.cache.store(&providers).await?;
        info!(
            custom = custom_count,
            external_fetch = fetch.external_fetch,
            providers = providers.len(),
            skipped = records.len() - providers.len(),
            "oEmbed provider set rebuilt"
        );
        Ok(providers)
    }
}

impl std::fmt::Debug for MergedProviderRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergedProviderRepository")
            .field("fetch", &*self.fetch.read())
            .field("lookup", &self.lookup)
            .field("delegate", &self.delegate.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProviderRepository for MergedProviderRepository {
    async fn get_all(&self) -> Result<ProviderMap> {
        if let Some(providers) = self.cache.load().await? {
            debug!(providers = providers.len(), "oEmbed provider set served from cache");
            return Ok(providers);
        }
        self.rebuild().await
    }

    async fn get(&self, name: &str) -> Result<Provider> {
        if let (LookupMode::Delegate, Some(delegate)) = (self.lookup, &self.delegate) {
            return delegate.get(name).await;
        }
        let providers = self.get_all().await?;
        find(&providers, name)
    }

    async fn invalidate(&self) -> Result<()> {
        self.cache.clear().await?;
        debug!("oEmbed provider cache invalidated");
        Ok(())
    }

    fn reconfigure(&self, fetch: FetchSettings) {
        info!(url = %fetch.providers_url, external_fetch = fetch.external_fetch, "Provider fetch settings changed");
        *self.fetch.write() = fetch;
    }
}
