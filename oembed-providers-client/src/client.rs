//! Provider database HTTP client
//!
//! Fetches `providers.json` style documents: a JSON array of
//! `{provider_name, provider_url, endpoints: [...]}` entries.

use std::time::Duration;

use reqwest::{header::{HeaderMap, HeaderValue, USER_AGENT}, Client};
use serde_json::Value;
use tracing::debug;

use super::error::{check_response, json_with_limit, ProviderDatabaseError};

/// Connect/total timeouts applied to every database request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    pub connect: Duration,
    pub total: Duration,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            total: Duration::from_secs(10),
        }
    }
}

/// Provider database HTTP client
pub struct ProviderDatabaseClient {
    client: Client,
    timeouts: ClientTimeouts,
}

impl ProviderDatabaseClient {
    /// Create a client with bounded timeouts
    pub fn new(timeouts: ClientTimeouts) -> Result<Self, ProviderDatabaseError> {
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.total)
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|e| ProviderDatabaseError::InvalidConfig(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, timeouts })
    }

    #[must_use]
    pub const fn timeouts(&self) -> ClientTimeouts {
        self.timeouts
    }

    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("oembed-providers/", env!("CARGO_PKG_VERSION"))),
        );
        headers
    }

    /// Download and decode the provider database at `url`
    ///
    /// Succeeds only for a non-empty JSON array; entries are returned untouched.
    pub async fn fetch(&self, url: &str) -> Result<Vec<Value>, ProviderDatabaseError> {
        let parsed = url::Url::parse(url)
            .map_err(|e| ProviderDatabaseError::InvalidConfig(format!("Invalid provider database URL {url}: {e}")))?;

        let response = self
            .client
            .get(parsed)
            .headers(Self::build_headers())
            .send()
            .await?;

        let response = check_response(response)?;
        let body: Value = json_with_limit(response).await?;

        match body {
            Value::Array(entries) if !entries.is_empty() => {
                debug!(url = %url, entries = entries.len(), "Provider database fetched");
                Ok(entries)
            }
            _ => Err(ProviderDatabaseError::InvalidList),
        }
    }
}
