//! Persisted module settings

use async_trait::async_trait;
use oembed_providers_client::DEFAULT_PROVIDERS_URL;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::Result;

/// File name of the settings record inside the data directory
pub const SETTINGS_FILE: &str = "settings.yml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where the external provider database is fetched from
    pub oembed_providers_url: String,
    /// Whether the external database is merged in at all
    pub external_fetch: bool,
    /// Provider names enabled for embedding
    pub allowed_providers: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            oembed_providers_url: DEFAULT_PROVIDERS_URL.to_string(),
            external_fetch: true,
            allowed_providers: Vec::new(),
        }
    }
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Stored settings, or defaults when nothing was saved yet
    async fn load(&self) -> Result<Settings>;

    async fn save(&self, settings: &Settings) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: RwLock<Settings>,
}

impl MemorySettingsStore {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Settings> {
        Ok(self.settings.read().clone())
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        *self.settings.write() = settings.clone();
        Ok(())
    }
}

/// `settings.yml` inside a data directory
#[derive(Debug, Clone)]
pub struct YamlSettingsStore {
    path: PathBuf,
}

impl YamlSettingsStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SETTINGS_FILE),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for YamlSettingsStore {
    async fn load(&self) -> Result<Settings> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            debug!(path = ?self.path, "No settings file, using defaults");
            return Ok(Settings::default());
        }
        let contents = fs::read_to_string(&self.path).await?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serde_yaml::to_string(settings)?).await?;
        Ok(())
    }
}
