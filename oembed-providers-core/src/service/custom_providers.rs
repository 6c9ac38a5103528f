//! Custom provider management
//!
//! Every successful mutation clears the merged provider cache before
//! returning.

use std::sync::Arc;
use tracing::info;

use crate::cache::{CacheInvalidationService, InvalidationTrigger};
use crate::storage::{CustomProvider, CustomProviderStore};
use crate::{Error, Result};

#[derive(Clone)]
pub struct CustomProviderService {
    store: Arc<dyn CustomProviderStore>,
    invalidation: CacheInvalidationService,
}

impl std::fmt::Debug for CustomProviderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomProviderService").finish_non_exhaustive()
    }
}

impl CustomProviderService {
    pub fn new(store: Arc<dyn CustomProviderStore>, invalidation: CacheInvalidationService) -> Self {
        Self { store, invalidation }
    }

    pub async fn list(&self) -> Result<Vec<CustomProvider>> {
        self.store.load_all().await
    }

    pub async fn get(&self, id: &str) -> Result<CustomProvider> {
        self.store
            .load(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Add a new custom provider
    pub async fn create(&self, provider: CustomProvider) -> Result<CustomProvider> {
        provider.validate()?;
        if self.store.load(&provider.id).await?.is_some() {
            return Err(Error::AlreadyExists(format!("Custom provider '{}'", provider.id)));
        }

        self.store.save(&provider).await?;
        self.invalidation
            .invalidate(&InvalidationTrigger::CustomProviderCreated {
                id: provider.id.clone(),
            })
            .await?;

        info!(id = %provider.id, label = %provider.label, "Custom provider created");
        Ok(provider)
    }

    /// Replace an existing custom provider
    pub async fn update(&self, provider: CustomProvider) -> Result<CustomProvider> {
        provider.validate()?;
        if self.store.load(&provider.id).await?.is_none() {
            return Err(Error::NotFound(provider.id));
        }

        self.store.save(&provider).await?;
        self.invalidation
            .invalidate(&InvalidationTrigger::CustomProviderUpdated {
                id: provider.id.clone(),
            })
            .await?;

        info!(id = %provider.id, label = %provider.label, "Custom provider updated");
        Ok(provider)
    }

    /// Create or update depending on whether `id` is already stored
    pub async fn upsert(&self, provider: CustomProvider) -> Result<CustomProvider> {
        if self.store.load(&provider.id).await?.is_some() {
            self.update(provider).await
        } else {
            self.create(provider).await
        }
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(Error::NotFound(id.to_string()));
        }

        self.invalidation
            .invalidate(&InvalidationTrigger::CustomProviderDeleted { id: id.to_string() })
            .await?;

        info!(id = %id, "Custom provider deleted");
        Ok(())
    }
}
