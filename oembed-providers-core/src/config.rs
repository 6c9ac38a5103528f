use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use oembed_providers_client::ClientTimeouts;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::DEFAULT_MEDIA_SOURCE_CACHE_KEY;
use crate::logging::parse_log_level;
use crate::repository::{FetchSettings, LookupMode, RepositoryConfig, DEFAULT_MAX_AGE_SECS};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Lifetime of a cached provider set
    pub max_age_secs: u64,
    pub lookup: LookupMode,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            lookup: LookupMode::default(),
            connect_timeout_secs: 5,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Shared Redis cache; empty keeps the cache in process
    pub redis_url: String,
    pub key_prefix: String,
    /// Entry limit of the in-process cache
    pub max_capacity: u64,
    /// Key of the host's media source definitions
    pub media_source_key: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: String::new(),
            key_prefix: "oembed:".to_string(),
            max_capacity: 1_000,
            media_source_key: DEFAULT_MEDIA_SOURCE_CACHE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Holds `settings.yml` and the custom provider directory
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    #[must_use]
    pub fn custom_providers_dir(&self) -> PathBuf {
        self.data_dir().join("custom_providers")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // OEMBED_PROVIDERS__MAX_AGE_SECS, OEMBED_CACHE__REDIS_URL, ...
        builder = builder.add_source(
            Environment::with_prefix("OEMBED")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Check every section, reporting all problems at once
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.providers.connect_timeout_secs == 0 {
            errors.push("providers.connect_timeout_secs must be greater than 0".to_string());
        }
        if self.providers.request_timeout_secs == 0 {
            errors.push("providers.request_timeout_secs must be greater than 0".to_string());
        }
        if self.providers.request_timeout_secs < self.providers.connect_timeout_secs {
            errors.push("providers.request_timeout_secs must not be shorter than connect_timeout_secs".to_string());
        }

        if !self.cache.redis_url.is_empty() && url::Url::parse(&self.cache.redis_url).is_err() {
            errors.push(format!("cache.redis_url is not a valid URL: {}", self.cache.redis_url));
        }
        if self.cache.max_capacity == 0 {
            errors.push("cache.max_capacity must be greater than 0".to_string());
        }
        if self.cache.media_source_key.trim().is_empty() {
            errors.push("cache.media_source_key must not be empty".to_string());
        }

        if self.storage.data_dir.trim().is_empty() {
            errors.push("storage.data_dir must not be empty".to_string());
        }

        if parse_log_level(&self.logging.level).is_err() {
            errors.push(format!("logging.level is invalid: {}", self.logging.level));
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!("logging.format must be 'json' or 'pretty', got '{}'", self.logging.format));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Whether the provider caches live in Redis
    #[must_use]
    pub fn uses_redis(&self) -> bool {
        !self.cache.redis_url.is_empty()
    }

    #[must_use]
    pub fn client_timeouts(&self) -> ClientTimeouts {
        ClientTimeouts {
            connect: Duration::from_secs(self.providers.connect_timeout_secs),
            total: Duration::from_secs(self.providers.request_timeout_secs),
        }
    }

    /// Repository configuration for the given stored fetch settings
    #[must_use]
    pub fn repository_config(&self, fetch: FetchSettings) -> RepositoryConfig {
        RepositoryConfig {
            fetch,
            max_age_secs: self.providers.max_age_secs,
            lookup: self.providers.lookup,
        }
    }
}
