//! Cache invalidation on configuration changes
//!
//! Every administrative mutation maps to an `InvalidationTrigger`; the
//! service clears the caches that trigger affects before the mutating call
//! returns, so the next read is guaranteed a rebuild.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::CacheBackend;
use crate::Result;

/// Cache key of the merged (custom + external) provider set
pub const PROVIDERS_CACHE_KEY: &str = "oembed_providers:oembed_providers";

/// Cache key of the host default provider set (external database only)
pub const DEFAULT_PROVIDERS_CACHE_KEY: &str = "media:oembed_providers";

/// Default key of the host's media source definitions cache
pub const DEFAULT_MEDIA_SOURCE_CACHE_KEY: &str = "media_source_plugins";

/// Configuration changes that invalidate cached data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvalidationTrigger {
    /// Provider database URL saved
    ProvidersUrlSaved,
    /// External fetch turned on or off
    ExternalFetchToggled,
    /// Allow-list saved
    AllowedProvidersSaved,
    CustomProviderCreated {
        id: String,
    },
    CustomProviderUpdated {
        id: String,
    },
    CustomProviderDeleted {
        id: String,
    },
}

/// A cache cleared by invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTarget {
    /// Merged provider set
    Providers,
    /// Host default provider set
    DefaultProviders,
    /// Host media source definitions
    MediaSources,
}

impl InvalidationTrigger {
    /// Caches this trigger must clear
    #[must_use]
    pub const fn targets(&self) -> &'static [CacheTarget] {
        match self {
            // The host default set is read from the same URL.
            Self::ProvidersUrlSaved => &[CacheTarget::Providers, CacheTarget::DefaultProviders],
            Self::ExternalFetchToggled
            | Self::CustomProviderCreated { .. }
            | Self::CustomProviderUpdated { .. }
            | Self::CustomProviderDeleted { .. } => &[CacheTarget::Providers],
            // Provider identities are unchanged, only their availability.
            Self::AllowedProvidersSaved => &[CacheTarget::MediaSources],
        }
    }
}

/// Clears caches synchronously for each trigger
#[derive(Clone)]
pub struct CacheInvalidationService {
    /// Backend holding both provider sets
    providers_cache: Arc<dyn CacheBackend>,
    /// Host-side backend holding media source definitions
    media_source_cache: Arc<dyn CacheBackend>,
    media_source_key: String,
}

impl CacheInvalidationService {
    pub fn new(
        providers_cache: Arc<dyn CacheBackend>,
        media_source_cache: Arc<dyn CacheBackend>,
        media_source_key: impl Into<String>,
    ) -> Self {
        Self {
            providers_cache,
            media_source_cache,
            media_source_key: media_source_key.into(),
        }
    }

    /// Clear every cache `trigger` affects
    pub async fn invalidate(&self, trigger: &InvalidationTrigger) -> Result<()> {
        for target in trigger.targets() {
            match target {
                CacheTarget::Providers => self.providers_cache.delete(PROVIDERS_CACHE_KEY).await?,
                CacheTarget::DefaultProviders => {
                    self.providers_cache.delete(DEFAULT_PROVIDERS_CACHE_KEY).await?;
                }
                CacheTarget::MediaSources => self.media_source_cache.delete(&self.media_source_key).await?,
            }
        }

        info!(trigger = ?trigger, targets = ?trigger.targets(), "Caches invalidated");
        Ok(())
    }
}

impl std::fmt::Debug for CacheInvalidationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheInvalidationService")
            .field("media_source_key", &self.media_source_key)
            .finish_non_exhaustive()
    }
}
