//! Custom provider storage
//!
//! Entities are kept ordered by id. The YAML store writes one `<id>.yml`
//! file per entity, the layout of exported configuration entities.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::entity::{is_machine_name, CustomProvider};
use crate::provider::RawProvider;
use crate::{Error, Result};

#[async_trait]
pub trait CustomProviderStore: Send + Sync {
    /// All entities, ordered by id
    async fn load_all(&self) -> Result<Vec<CustomProvider>>;

    async fn load(&self, id: &str) -> Result<Option<CustomProvider>>;

    /// Insert or replace the entity with the same id
    async fn save(&self, provider: &CustomProvider) -> Result<()>;

    /// Remove an entity; returns whether it existed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Custom providers projected into raw records, ordered by id
    async fn list(&self) -> Result<Vec<RawProvider>> {
        let providers = self.load_all().await?;
        Ok(providers.iter().map(CustomProvider::to_raw).collect())
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryCustomProviderStore {
    providers: RwLock<BTreeMap<String, CustomProvider>>,
}

impl MemoryCustomProviderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `providers`
    pub fn with_providers(providers: impl IntoIterator<Item = CustomProvider>) -> Self {
        Self {
            providers: RwLock::new(providers.into_iter().map(|p| (p.id.clone(), p)).collect()),
        }
    }
}

#[async_trait]
impl CustomProviderStore for MemoryCustomProviderStore {
    async fn load_all(&self) -> Result<Vec<CustomProvider>> {
        Ok(self.providers.read().values().cloned().collect())
    }

    async fn load(&self, id: &str) -> Result<Option<CustomProvider>> {
        Ok(self.providers.read().get(id).cloned())
    }

    async fn save(&self, provider: &CustomProvider) -> Result<()> {
        self.providers.write().insert(provider.id.clone(), provider.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.providers.write().remove(id).is_some())
    }
}

/// Directory of `<id>.yml` files
#[derive(Debug, Clone)]
pub struct YamlCustomProviderStore {
    dir: PathBuf,
}

impl YamlCustomProviderStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for `id`; ids that are not machine names never reach the filesystem
    fn path(&self, id: &str) -> Result<PathBuf> {
        if !is_machine_name(id) {
            return Err(Error::InvalidInput(format!("Invalid custom provider id '{id}'")));
        }
        Ok(self.dir.join(format!("{id}.yml")))
    }

    async fn read(path: &Path) -> Result<CustomProvider> {
        let contents = fs::read_to_string(path).await?;
        Ok(serde_yaml::from_str(&contents)?)
    }
}

#[async_trait]
impl CustomProviderStore for YamlCustomProviderStore {
    async fn load_all(&self) -> Result<Vec<CustomProvider>> {
        if !fs::try_exists(&self.dir).await.unwrap_or(false) {
            debug!(dir = ?self.dir, "Custom provider directory does not exist");
            return Ok(Vec::new());
        }

        let mut providers = BTreeMap::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yml") {
                continue;
            }

            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if !is_machine_name(stem) {
                warn!(path = ?path, "Skipping custom provider file without a machine name");
                continue;
            }

            match Self::read(&path).await {
                Ok(provider) if provider.id == stem => {
                    providers.insert(provider.id.clone(), provider);
                }
                Ok(provider) => {
                    warn!(path = ?path, id = %provider.id, "Skipping custom provider file named after another id");
                }
                Err(e) => {
                    warn!(path = ?path, error = %e, "Skipping unreadable custom provider file");
                }
            }
        }

        Ok(providers.into_values().collect())
    }

    async fn load(&self, id: &str) -> Result<Option<CustomProvider>> {
        let path = self.path(id)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        Self::read(&path).await.map(Some)
    }

    async fn save(&self, provider: &CustomProvider) -> Result<()> {
        let path = self.path(&provider.id)?;
        fs::create_dir_all(&self.dir).await?;
        fs::write(&path, serde_yaml::to_string(provider)?).await?;

        debug!(path = ?path, "Saved custom provider");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let path = self.path(id)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(false);
        }
        fs::remove_file(&path).await?;

        debug!(path = ?path, "Deleted custom provider");
        Ok(true)
    }
}
