//! Provider database client error types
//!
//! Every failure reaching the provider database surfaces as one of these.

use thiserror::Error;

/// Maximum response body size for the provider database (16 MB).
/// Prevents OOM from a misconfigured or hostile database URL.
pub const MAX_RESPONSE_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProviderDatabaseError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error {status} for {url}")]
    Http { status: reqwest::StatusCode, url: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Provider database is not a non-empty list")]
    InvalidList,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Response too large ({size} bytes, max {MAX_RESPONSE_SIZE})")]
    ResponseTooLarge { size: u64 },
}

/// Read a response body with size limit and deserialize as JSON.
///
/// Checks the `Content-Length` hint first (if available), then reads the
/// body chunk by chunk and stops as soon as the running total passes the
/// limit, so bodies without a length are never buffered past it.
pub async fn json_with_limit<T: serde::de::DeserializeOwned>(
    mut response: reqwest::Response,
) -> Result<T, ProviderDatabaseError> {
    if let Some(cl) = response.content_length() {
        if cl > MAX_RESPONSE_SIZE as u64 {
            return Err(ProviderDatabaseError::ResponseTooLarge { size: cl });
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > MAX_RESPONSE_SIZE {
            return Err(ProviderDatabaseError::ResponseTooLarge {
                size: (body.len() + chunk.len()) as u64,
            });
        }
        body.extend_from_slice(&chunk);
    }
    serde_json::from_slice(&body).map_err(Into::into)
}

/// Check HTTP response status before processing body.
pub fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ProviderDatabaseError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(ProviderDatabaseError::Http {
            status,
            url: resp.url().to_string(),
        });
    }
    Ok(resp)
}

impl From<reqwest::Error> for ProviderDatabaseError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ProviderDatabaseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
