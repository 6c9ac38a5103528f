//! Administrator-managed custom provider entities

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::provider::model::is_external_url;
use crate::provider::{Endpoint, RawEndpoint, RawProvider, ValidationError};

/// Pre-compiled machine name regex
static MACHINE_NAME_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[a-z0-9_]+$").expect("machine name regex is a compile-time constant and always valid")
});

/// True when `id` is a usable machine name
#[must_use]
pub fn is_machine_name(id: &str) -> bool {
    MACHINE_NAME_REGEX.is_match(id)
}

/// A stored endpoint as the administrator entered it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomEndpoint {
    #[serde(default)]
    pub schemes: Vec<String>,
    pub url: String,
    #[serde(default)]
    pub discovery: bool,
    /// Format name -> enabled
    #[serde(default)]
    pub formats: BTreeMap<String, bool>,
}

impl CustomEndpoint {
    /// Endpoint serving the given formats
    pub fn new<S, F>(url: impl Into<String>, schemes: S, formats: F) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            schemes: schemes.into_iter().map(Into::into).collect(),
            url: url.into(),
            discovery: false,
            formats: formats.into_iter().map(|f| (f.into(), true)).collect(),
        }
    }

    #[must_use]
    pub const fn with_discovery(mut self, discovery: bool) -> Self {
        self.discovery = discovery;
        self
    }
}

/// A custom oEmbed provider, keyed by machine name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomProvider {
    pub id: String,
    pub label: String,
    pub provider_url: String,
    #[serde(default)]
    pub endpoints: Vec<CustomEndpoint>,
}

impl CustomProvider {
    pub fn new(id: impl Into<String>, label: impl Into<String>, provider_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            provider_url: provider_url.into(),
            endpoints: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: CustomEndpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Check the entity can be saved
    ///
    /// Applies the same endpoint rules as the rebuild, so a saved entity
    /// never gets dropped from the merged set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_machine_name(&self.id) {
            return Err(ValidationError::InvalidMachineName(self.id.clone()));
        }
        if self.label.trim().is_empty() {
            return Err(ValidationError::MissingField("label"));
        }
        if !is_external_url(&self.provider_url) {
            return Err(ValidationError::InvalidProviderUrl {
                provider: self.label.clone(),
            });
        }
        if self.endpoints.is_empty() {
            return Err(ValidationError::NoEndpoints {
                provider: self.label.clone(),
            });
        }
        for endpoint in &self.endpoints {
            Endpoint::from_storage(endpoint)?;
        }
        Ok(())
    }

    /// Project into the raw record shape used for merging
    #[must_use]
    pub fn to_raw(&self) -> RawProvider {
        RawProvider {
            provider_name: Some(self.label.clone()),
            provider_url: Some(self.provider_url.clone()),
            endpoints: Some(self.endpoints.iter().map(RawEndpoint::from_storage).collect()),
        }
    }
}
