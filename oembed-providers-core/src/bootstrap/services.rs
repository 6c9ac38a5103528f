//! Service initialization and dependency injection

use std::sync::Arc;

use oembed_providers_client::{ProviderDatabase, ProviderDatabaseClient};
use tracing::info;

use crate::{
    cache::{CacheBackend, CacheInvalidationService, MemoryCacheBackend, RedisCacheBackend},
    repository::{DefaultProviderRepository, FetchSettings, MergedProviderRepository},
    service::{AllowedProviderFilter, CustomProviderService, SettingsService},
    storage::{CustomProviderStore, SettingsStore, YamlCustomProviderStore, YamlSettingsStore},
    time::{Clock, SystemClock},
    Config,
};

/// Container for all initialized services
#[derive(Clone)]
pub struct Services {
    /// Merged custom + external provider repository
    pub repository: Arc<MergedProviderRepository>,
    /// Host default repository (external database only)
    pub default_repository: Arc<DefaultProviderRepository>,
    pub allowed_filter: AllowedProviderFilter,
    pub custom_provider_service: CustomProviderService,
    pub settings_service: SettingsService,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("repository", &self.repository)
            .field("default_repository", &self.default_repository)
            .finish_non_exhaustive()
    }
}

/// Initialize all services from configuration
pub async fn init_services(config: &Config) -> Result<Services, anyhow::Error> {
    info!("Initializing services...");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let cache: Arc<dyn CacheBackend> = if config.uses_redis() {
        info!(prefix = %config.cache.key_prefix, "Using Redis cache backend");
        Arc::new(RedisCacheBackend::new(
            &config.cache.redis_url,
            config.cache.key_prefix.clone(),
            clock.clone(),
        )?)
    } else {
        info!(capacity = config.cache.max_capacity, "Using in-process cache backend");
        Arc::new(MemoryCacheBackend::new(config.cache.max_capacity, clock.clone()))
    };

    let database: Arc<dyn ProviderDatabase> = Arc::new(ProviderDatabaseClient::new(config.client_timeouts())?);

    let settings_store: Arc<dyn SettingsStore> = Arc::new(YamlSettingsStore::new(config.storage.data_dir()));
    let custom_store: Arc<dyn CustomProviderStore> =
        Arc::new(YamlCustomProviderStore::new(config.storage.custom_providers_dir()));
    let settings = settings_store.load().await?;
    let fetch = FetchSettings::from(&settings);

    let default_repository = Arc::new(
        DefaultProviderRepository::new(database.clone(), cache.clone(), clock.clone(), fetch.providers_url.clone())
            .with_max_age(config.providers.max_age_secs),
    );
    let repository = Arc::new(
        MergedProviderRepository::new(
            custom_store.clone(),
            database,
            cache.clone(),
            clock,
            config.repository_config(fetch),
        )
        .with_delegate(default_repository.clone()),
    );
    info!(
        url = %settings.oembed_providers_url,
        external_fetch = settings.external_fetch,
        lookup = ?config.providers.lookup,
        "Provider repositories initialized"
    );

    let invalidation = CacheInvalidationService::new(cache.clone(), cache.clone(), config.cache.media_source_key.clone());

    let settings_service = SettingsService::new(settings_store.clone(), invalidation.clone())
        .with_repository(repository.clone())
        .with_repository(default_repository.clone());
    let custom_provider_service = CustomProviderService::new(custom_store, invalidation);
    let allowed_filter = AllowedProviderFilter::new(repository.clone(), settings_store);

    info!("Services initialized");

    Ok(Services {
        repository,
        default_repository,
        allowed_filter,
        custom_provider_service,
        settings_service,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::ProviderRepository;
    use crate::storage::{CustomEndpoint, CustomProvider};

    fn config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.storage.data_dir = dir.to_string_lossy().into_owned();
        config
    }

    #[tokio::test]
    async fn test_services_share_storage_and_cache() {
        let dir = tempfile::tempdir().unwrap();
        let services = init_services(&config(dir.path())).await.unwrap();

        services.settings_service.set_external_fetch(false).await.unwrap();
        services
            .custom_provider_service
            .create(
                CustomProvider::new("acme", "Acme", "https://acme.example.com/").with_endpoint(CustomEndpoint::new(
                    "https://acme.example.com/oembed",
                    ["https://acme.example.com/v/*"],
                    ["json"],
                )),
            )
            .await
            .unwrap();

        let providers = services.repository.get_all().await.unwrap();
        assert_eq!(providers.keys().collect::<Vec<_>>(), ["Acme"]);
        assert!(dir.path().join("settings.yml").exists());
        assert!(dir.path().join("custom_providers/acme.yml").exists());
    }

    #[tokio::test]
    async fn test_stored_settings_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.yml"), "external_fetch: false\n").unwrap();

        let services = init_services(&config(dir.path())).await.unwrap();

        assert!(!services.repository.fetch_settings().external_fetch);
    }
}
