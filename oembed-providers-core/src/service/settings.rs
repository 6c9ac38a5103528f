//! Module settings management
//!
//! Saving the providers URL or the external fetch flag pushes the new fetch
//! settings into the repositories and clears the provider caches. Saving the
//! allow-list clears the host's media source definitions.

use std::sync::Arc;
use tracing::info;

use crate::cache::{CacheInvalidationService, InvalidationTrigger};
use crate::provider::model::is_external_url;
use crate::repository::{FetchSettings, ProviderRepository};
use crate::storage::{Settings, SettingsStore};
use crate::{Error, Result};

#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
    invalidation: CacheInvalidationService,
    /// Repositories that read the providers URL
    repositories: Vec<Arc<dyn ProviderRepository>>,
}

impl std::fmt::Debug for SettingsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsService")
            .field("repositories", &self.repositories.len())
            .finish_non_exhaustive()
    }
}

impl SettingsService {
    pub fn new(store: Arc<dyn SettingsStore>, invalidation: CacheInvalidationService) -> Self {
        Self {
            store,
            invalidation,
            repositories: Vec::new(),
        }
    }

    /// Keep `repository` in sync with saved fetch settings
    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn ProviderRepository>) -> Self {
        self.repositories.push(repository);
        self
    }

    pub async fn settings(&self) -> Result<Settings> {
        self.store.load().await
    }

    /// Push the stored fetch settings into every repository
    pub async fn apply(&self) -> Result<Settings> {
        let settings = self.store.load().await?;
        self.reconfigure(&settings);
        Ok(settings)
    }

    pub async fn save_providers_url(&self, url: &str) -> Result<Settings> {
        let url = url.trim();
        if !is_external_url(url) {
            return Err(Error::InvalidInput(format!(
                "The providers URL must be an absolute http(s) URL, got '{url}'"
            )));
        }

        let mut settings = self.store.load().await?;
        settings.oembed_providers_url = url.to_string();
        self.store.save(&settings).await?;

        self.reconfigure(&settings);
        self.invalidation
            .invalidate(&InvalidationTrigger::ProvidersUrlSaved)
            .await?;

        info!(url = %url, "oEmbed providers URL saved");
        Ok(settings)
    }

    pub async fn set_external_fetch(&self, enabled: bool) -> Result<Settings> {
        let mut settings = self.store.load().await?;
        settings.external_fetch = enabled;
        self.store.save(&settings).await?;

        self.reconfigure(&settings);
        self.invalidation
            .invalidate(&InvalidationTrigger::ExternalFetchToggled)
            .await?;

        info!(enabled, "External provider fetch toggled");
        Ok(settings)
    }

    /// Save the allow-list, dropping blank entries and duplicates
    pub async fn save_allowed_providers<I, S>(&self, names: I) -> Result<Settings>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() && !allowed.iter().any(|n| n == name) {
                allowed.push(name.to_string());
            }
        }

        let mut settings = self.store.load().await?;
        settings.allowed_providers = allowed;
        self.store.save(&settings).await?;

        self.invalidation
            .invalidate(&InvalidationTrigger::AllowedProvidersSaved)
            .await?;

        info!(allowed = ?settings.allowed_providers, "Allowed oEmbed providers saved");
        Ok(settings)
    }

    fn reconfigure(&self, settings: &Settings) {
        for repository in &self.repositories {
            repository.reconfigure(FetchSettings::from(settings));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheBackend, MemoryCacheBackend, DEFAULT_PROVIDERS_CACHE_KEY, PROVIDERS_CACHE_KEY};
    use crate::repository::test_support::{entry, StubDatabase};
    use crate::repository::{MergedProviderRepository, RepositoryConfig};
    use crate::storage::{MemoryCustomProviderStore, MemorySettingsStore};
    use crate::time::ManualClock;

    struct Fixture {
        service: SettingsService,
        repository: Arc<MergedProviderRepository>,
        database: Arc<StubDatabase>,
        providers: Arc<MemoryCacheBackend>,
        media: Arc<MemoryCacheBackend>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(0));
        let providers = Arc::new(MemoryCacheBackend::new(10, clock.clone()));
        let media = Arc::new(MemoryCacheBackend::new(10, clock.clone()));
        let database = Arc::new(StubDatabase::with_entries(vec![entry("Vimeo", "https://vimeo.com/")]));
        let repository = Arc::new(MergedProviderRepository::new(
            Arc::new(MemoryCustomProviderStore::new()),
            database.clone(),
            providers.clone(),
            clock,
            RepositoryConfig::default(),
        ));
        let invalidation = CacheInvalidationService::new(providers.clone(), media.clone(), "media_source_plugins");
        let service = SettingsService::new(Arc::new(MemorySettingsStore::default()), invalidation)
            .with_repository(repository.clone());
        Fixture {
            service,
            repository,
            database,
            providers,
            media,
        }
    }

    #[tokio::test]
    async fn test_save_url_reconfigures_and_invalidates() {
        let f = fixture();
        f.repository.get_all().await.unwrap();
        f.providers
            .set(DEFAULT_PROVIDERS_CACHE_KEY, "{}".to_string(), None)
            .await
            .unwrap();

        let settings = f
            .service
            .save_providers_url(" https://mirror.example.com/providers.json ")
            .await
            .unwrap();

        assert_eq!(settings.oembed_providers_url, "https://mirror.example.com/providers.json");
        assert!(f.providers.get(PROVIDERS_CACHE_KEY).await.unwrap().is_none());
        assert!(f.providers.get(DEFAULT_PROVIDERS_CACHE_KEY).await.unwrap().is_none());

        f.repository.get_all().await.unwrap();
        assert_eq!(
            f.database.urls().last().map(String::as_str),
            Some("https://mirror.example.com/providers.json")
        );
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let f = fixture();
        for url in ["", "providers.json", "ftp://example.com/providers.json"] {
            assert!(matches!(
                f.service.save_providers_url(url).await,
                Err(Error::InvalidInput(_))
            ));
        }
        assert_eq!(
            f.service.settings().await.unwrap().oembed_providers_url,
            oembed_providers_client::DEFAULT_PROVIDERS_URL
        );
    }

    #[tokio::test]
    async fn test_toggle_external_fetch() {
        let f = fixture();
        assert_eq!(f.repository.get_all().await.unwrap().len(), 1);

        f.service.set_external_fetch(false).await.unwrap();

        assert!(!f.repository.fetch_settings().external_fetch);
        assert!(f.repository.get_all().await.unwrap().is_empty());
        assert_eq!(f.database.calls(), 1);
    }

    #[tokio::test]
    async fn test_save_allowed_providers() {
        let f = fixture();
        f.media
            .set("media_source_plugins", "{}".to_string(), None)
            .await
            .unwrap();
        f.repository.get_all().await.unwrap();

        let settings = f
            .service
            .save_allowed_providers(["Vimeo", " ", "YouTube", "Vimeo"])
            .await
            .unwrap();

        assert_eq!(settings.allowed_providers, ["Vimeo", "YouTube"]);
        assert!(f.media.get("media_source_plugins").await.unwrap().is_none());
        assert!(f.providers.get(PROVIDERS_CACHE_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_apply_pushes_stored_settings() {
        let f = fixture();
        let store = Arc::new(MemorySettingsStore::new(Settings {
            external_fetch: false,
            ..Settings::default()
        }));
        let invalidation = CacheInvalidationService::new(f.providers.clone(), f.media.clone(), "media_source_plugins");
        let service = SettingsService::new(store, invalidation).with_repository(f.repository.clone());

        service.apply().await.unwrap();

        assert!(!f.repository.fetch_settings().external_fetch);
    }
}
