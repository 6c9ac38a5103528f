// oEmbed Provider Database Client
//
// Pure HTTP client for the public oEmbed provider database (providers.json).
// Independent of the provider repository; entries are returned as raw JSON so
// that record-level validation can happen one entry at a time upstream.
//
// Architecture:
// - oembed-providers-client: HTTP fetch + gross shape check (this crate)
// - oembed-providers-core: merge, validation, caching, invalidation
// - oembed-providers: CLI wiring

// Shared error types
pub mod error;

// HTTP client
mod client;
pub mod service;

pub use client::{ClientTimeouts, ProviderDatabaseClient};
pub use error::ProviderDatabaseError;
pub use service::ProviderDatabase;

/// Location of the public provider database maintained by oembed.com.
pub const DEFAULT_PROVIDERS_URL: &str = "https://oembed.com/providers.json";
