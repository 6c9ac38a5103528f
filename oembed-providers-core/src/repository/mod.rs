//! Provider repositories
//!
//! `DefaultProviderRepository` serves the external database alone, the way
//! the host's own provider source does. `MergedProviderRepository` merges in
//! custom providers and can hand single lookups to a delegate.

pub mod default;
pub mod merged;

use async_trait::async_trait;
use oembed_providers_client::{ProviderDatabase, DEFAULT_PROVIDERS_URL};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::cache::{get_json, set_json, CacheBackend};
use crate::provider::{Provider, ProviderMap, RawProvider};
use crate::storage::Settings;
use crate::time::Clock;
use crate::{Error, Result};

pub use default::DefaultProviderRepository;
pub use merged::MergedProviderRepository;

/// Default lifetime of a cached provider set (one week)
pub const DEFAULT_MAX_AGE_SECS: u64 = 604_800;

#[async_trait]
pub trait ProviderRepository: Send + Sync {
    /// Every valid provider, keyed by name
    async fn get_all(&self) -> Result<ProviderMap>;

    /// A single provider; unknown names are `Error::NotFound`
    async fn get(&self, name: &str) -> Result<Provider>;

    /// Drop the cached set so the next read rebuilds it
    async fn invalidate(&self) -> Result<()>;

    /// Use new fetch settings from the next rebuild on
    fn reconfigure(&self, fetch: FetchSettings);
}

/// Where and whether to fetch the external database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSettings {
    pub providers_url: String,
    pub external_fetch: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            providers_url: DEFAULT_PROVIDERS_URL.to_string(),
            external_fetch: true,
        }
    }
}

impl From<&Settings> for FetchSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            providers_url: settings.oembed_providers_url.clone(),
            external_fetch: settings.external_fetch,
        }
    }
}

/// How `get(name)` resolves a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupMode {
    /// Look the name up in the merged set
    #[default]
    Merged,
    /// Ask the host default repository, which does not see custom providers
    Delegate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub fetch: FetchSettings,
    pub max_age_secs: u64,
    pub lookup: LookupMode,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            fetch: FetchSettings::default(),
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            lookup: LookupMode::default(),
        }
    }
}

/// A provider set stored under one cache key with a fixed lifetime
#[derive(Clone)]
pub(crate) struct ProviderCache {
    backend: Arc<dyn CacheBackend>,
    clock: Arc<dyn Clock>,
    key: &'static str,
    max_age_secs: u64,
}

impl ProviderCache {
    pub(crate) fn new(
        backend: Arc<dyn CacheBackend>,
        clock: Arc<dyn Clock>,
        key: &'static str,
        max_age_secs: u64,
    ) -> Self {
        Self {
            backend,
            clock,
            key,
            max_age_secs,
        }
    }

    pub(crate) async fn load(&self) -> Result<Option<ProviderMap>> {
        get_json(self.backend.as_ref(), self.key).await
    }

    pub(crate) async fn store(&self, providers: &ProviderMap) -> Result<()> {
        let max_age = i64::try_from(self.max_age_secs).unwrap_or(i64::MAX);
        let expires_at = self.clock.now().saturating_add(max_age);
        set_json(self.backend.as_ref(), self.key, providers, Some(expires_at)).await
    }

    pub(crate) async fn clear(&self) -> Result<()> {
        self.backend.delete(self.key).await
    }
}

/// Fetch the external database as raw records
///
/// Entries that do not even have the record shape are dropped here; the
/// rest are validated one by one during the rebuild.
pub(crate) async fn fetch_external(database: &dyn ProviderDatabase, url: &str) -> Result<Vec<RawProvider>> {
    let entries = database
        .fetch(url)
        .await
        .map_err(|e| Error::from_database(url, e))?;

    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let name = entry
                .get("provider_name")
                .and_then(|n| n.as_str())
                .unwrap_or_default()
                .to_string();
            match RawProvider::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(provider = %name, error = %e, "Skipping invalid oEmbed provider");
                    None
                }
            }
        })
        .collect())
}

/// Resolve `name` in a provider set
pub(crate) fn find(providers: &ProviderMap, name: &str) -> Result<Provider> {
    crate::provider::lookup(providers, name)
        .cloned()
        .ok_or_else(|| Error::NotFound(name.to_string()))
}
