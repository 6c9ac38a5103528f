use oembed_providers_client::ProviderDatabaseError;
use thiserror::Error;

use crate::provider::ValidationError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not retrieve the oEmbed provider database from {url}")]
    ProviderDatabase {
        url: String,
        #[source]
        source: ProviderDatabaseError,
    },

    #[error("Remote oEmbed providers database returned invalid or empty list ({url})")]
    InvalidProviderDatabase { url: String },

    #[error("Unknown provider '{0}'")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid provider: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a database client failure, keeping the URL that was requested
    pub fn from_database(url: &str, err: ProviderDatabaseError) -> Self {
        match err {
            ProviderDatabaseError::InvalidList => Self::InvalidProviderDatabase { url: url.to_string() },
            source => Self::ProviderDatabase {
                url: url.to_string(),
                source,
            },
        }
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
