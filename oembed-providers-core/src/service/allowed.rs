//! Allow-list view over the provider repository

use std::sync::Arc;

use crate::provider::ProviderMap;
use crate::repository::ProviderRepository;
use crate::storage::SettingsStore;
use crate::Result;

/// Whether an administrator has chosen any provider yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowListState {
    /// Nothing selected; no provider is enabled
    Unconfigured,
    Configured,
}

#[derive(Clone)]
pub struct AllowedProviderFilter {
    repository: Arc<dyn ProviderRepository>,
    settings: Arc<dyn SettingsStore>,
}

impl std::fmt::Debug for AllowedProviderFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllowedProviderFilter").finish_non_exhaustive()
    }
}

impl AllowedProviderFilter {
    pub fn new(repository: Arc<dyn ProviderRepository>, settings: Arc<dyn SettingsStore>) -> Self {
        Self { repository, settings }
    }

    pub async fn state(&self) -> Result<AllowListState> {
        let settings = self.settings.load().await?;
        Ok(if settings.allowed_providers.is_empty() {
            AllowListState::Unconfigured
        } else {
            AllowListState::Configured
        })
    }

    /// Every provider name an administrator can choose from
    pub async fn options(&self) -> Result<Vec<String>> {
        Ok(self.repository.get_all().await?.into_keys().collect())
    }

    /// Allowed providers, in repository order
    pub async fn active(&self) -> Result<ProviderMap> {
        let allowed = self.settings.load().await?.allowed_providers;
        let mut providers = self.repository.get_all().await?;
        providers.retain(|name, _| allowed.contains(name));
        Ok(providers)
    }

    pub async fn is_allowed(&self, name: &str) -> Result<bool> {
        let settings = self.settings.load().await?;
        Ok(settings.allowed_providers.iter().any(|n| n == name))
    }
}
