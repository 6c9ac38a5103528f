// oEmbed Provider Registry
//
// Merges administrator-defined custom providers with the public provider
// database, validates every record, and caches the merged set until a
// configuration change invalidates it.
//
// Architecture:
// - oembed-providers-client: HTTP fetch of the provider database
// - oembed-providers-core: records, storage, repositories, caching (this crate)
// - oembed-providers: CLI wiring

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod repository;
pub mod service;
pub mod storage;
pub mod time;

pub use config::Config;
pub use error::{Error, Result};
pub use provider::{Endpoint, Format, Provider, ProviderMap};
pub use repository::{LookupMode, ProviderRepository};
