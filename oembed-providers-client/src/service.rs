//! Provider database interface
//!
//! Repositories depend on this trait rather than on the HTTP client, so any
//! source of raw provider entries can stand in for the network.

use async_trait::async_trait;
use serde_json::Value;

use super::{ProviderDatabaseClient, ProviderDatabaseError};

#[async_trait]
pub trait ProviderDatabase: Send + Sync {
    /// Fetch the raw provider entries published at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<Value>, ProviderDatabaseError>;
}

#[async_trait]
impl ProviderDatabase for ProviderDatabaseClient {
    async fn fetch(&self, url: &str) -> Result<Vec<Value>, ProviderDatabaseError> {
        Self::fetch(self, url).await
    }
}
