// Provider Validation Errors

/// Reasons a raw record cannot become a [`Provider`](super::Provider)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Provider {provider} does not define a valid external URL")]
    InvalidProviderUrl { provider: String },

    #[error("Provider {provider} does not define any valid endpoint")]
    NoEndpoints { provider: String },

    #[error("oEmbed endpoint must have a valid external URL: '{0}'")]
    InvalidEndpointUrl(String),

    #[error("Endpoint {url} supports unsupported formats: {formats}")]
    UnsupportedFormats { url: String, formats: String },

    #[error("Endpoint {url} does not support any format")]
    NoFormats { url: String },

    #[error("Malformed provider record: {0}")]
    Malformed(String),

    #[error("Invalid machine name '{0}': only lowercase letters, digits and underscores are allowed")]
    InvalidMachineName(String),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
