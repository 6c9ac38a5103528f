// Validated provider records
//
// `Provider` and `Endpoint` can only be built through their validating
// constructors; once built they are never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{Result, ValidationError};

/// Response format an endpoint can serve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Xml,
}

impl Format {
    /// The fixed vocabulary, in canonical order
    pub const ALL: [Self; 2] = [Self::Json, Self::Xml];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            other => Err(other.to_string()),
        }
    }
}

/// Absolute http(s) URL with a host.
pub(crate) fn is_external_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}

/// One oEmbed API endpoint of a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    url: String,
    schemes: Vec<String>,
    formats: Vec<Format>,
    #[serde(default)]
    discovery: bool,
}

impl Endpoint {
    /// Validate and build an endpoint
    ///
    /// Schemes and formats are lower-cased. Formats must be non-empty and
    /// drawn from [`Format::ALL`]; duplicates collapse to one entry.
    pub fn new<S, F>(url: &str, schemes: S, formats: F, discovery: bool) -> Result<Self>
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        if !is_external_url(url) {
            return Err(ValidationError::InvalidEndpointUrl(url.to_string()));
        }

        let mut parsed = Vec::new();
        let mut unsupported = Vec::new();
        for format in formats {
            match format.as_ref().parse::<Format>() {
                Ok(format) if !parsed.contains(&format) => parsed.push(format),
                Ok(_) => {}
                Err(other) => unsupported.push(other),
            }
        }
        if !unsupported.is_empty() {
            return Err(ValidationError::UnsupportedFormats {
                url: url.to_string(),
                formats: unsupported.join(", "),
            });
        }
        if parsed.is_empty() {
            return Err(ValidationError::NoFormats { url: url.to_string() });
        }

        Ok(Self {
            url: url.to_string(),
            schemes: schemes.into_iter().map(|s| s.as_ref().to_lowercase()).collect(),
            formats: parsed,
            discovery,
        })
    }

    /// URL pattern of the endpoint (may contain a `{format}` placeholder)
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn schemes(&self) -> &[String] {
        &self.schemes
    }

    #[must_use]
    pub fn formats(&self) -> &[Format] {
        &self.formats
    }

    #[must_use]
    pub fn supports_format(&self, format: Format) -> bool {
        self.formats.contains(&format)
    }

    /// Whether the endpoint supports link-based discovery
    #[must_use]
    pub const fn supports_discovery(&self) -> bool {
        self.discovery
    }
}

/// A validated oEmbed provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    name: String,
    url: String,
    endpoints: Vec<Endpoint>,
}

impl Provider {
    /// Validate and build a provider
    pub fn new(name: impl Into<String>, url: impl Into<String>, endpoints: Vec<Endpoint>) -> Result<Self> {
        let name = name.into();
        let url = url.into();

        if name.trim().is_empty() {
            return Err(ValidationError::MissingField("provider_name"));
        }
        if !is_external_url(&url) {
            return Err(ValidationError::InvalidProviderUrl { provider: name });
        }
        if endpoints.is_empty() {
            return Err(ValidationError::NoEndpoints { provider: name });
        }

        Ok(Self { name, url, endpoints })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Home page of the provider
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Endpoints in declaration order
    #[must_use]
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }
}
