// Raw provider records
//
// The shape shared by the external database (providers.json) and projected
// custom providers. Nothing here is validated; conversion into `Provider`
// is where records get accepted or dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{Result, ValidationError};
use super::model::{Endpoint, Format, Provider};
use crate::storage::CustomEndpoint;

/// Formats assumed when a database entry omits the `formats` key
const DEFAULT_FORMATS: [Format; 1] = [Format::Json];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProvider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Vec<RawEndpoint>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEndpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schemes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formats: Option<Vec<String>>,
}

impl RawProvider {
    /// Interpret one entry of the external database
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ValidationError::Malformed(e.to_string()))
    }

    /// Provider name, or an empty string when absent
    #[must_use]
    pub fn name(&self) -> &str {
        self.provider_name.as_deref().unwrap_or_default()
    }
}

impl RawEndpoint {
    /// Project a stored custom endpoint into the raw record shape
    ///
    /// `discovery` is kept only when set. Formats are the keys flagged
    /// true, in vocabulary order, followed by any unknown flagged keys.
    #[must_use]
    pub fn from_storage(stored: &CustomEndpoint) -> Self {
        let enabled = |key: &str| stored.formats.get(key).copied().unwrap_or(false);

        let mut formats: Vec<String> = Format::ALL
            .iter()
            .map(|f| f.as_str())
            .filter(|&key| enabled(key))
            .map(str::to_string)
            .collect();
        formats.extend(
            stored
                .formats
                .iter()
                .filter(|(key, on)| **on && key.parse::<Format>().is_err())
                .map(|(key, _)| key.clone()),
        );

        Self {
            url: Some(stored.url.clone()),
            schemes: Some(stored.schemes.clone()),
            discovery: stored.discovery.then_some(true),
            formats: Some(formats),
        }
    }

    fn to_endpoint(&self) -> Result<Endpoint> {
        let url = self.url.as_deref().ok_or(ValidationError::MissingField("url"))?;
        let schemes = self.schemes.as_deref().unwrap_or_default();
        let discovery = self.discovery.unwrap_or(false);

        match &self.formats {
            Some(formats) => Endpoint::new(url, schemes, formats, discovery),
            None => Endpoint::new(url, schemes, DEFAULT_FORMATS.iter().map(|f| f.as_str()), discovery),
        }
    }
}

impl Endpoint {
    /// Build a validated endpoint straight from a stored custom endpoint
    pub fn from_storage(stored: &CustomEndpoint) -> Result<Self> {
        RawEndpoint::from_storage(stored).to_endpoint()
    }
}

impl TryFrom<&RawProvider> for Provider {
    type Error = ValidationError;

    fn try_from(raw: &RawProvider) -> Result<Self> {
        let name = raw
            .provider_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .ok_or(ValidationError::MissingField("provider_name"))?;
        let url = raw
            .provider_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(ValidationError::MissingField("provider_url"))?;

        // Any invalid endpoint rejects the whole record.
        let endpoints = raw
            .endpoints
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(RawEndpoint::to_endpoint)
            .collect::<Result<Vec<_>>>()?;

        Provider::new(name, url, endpoints)
    }
}
