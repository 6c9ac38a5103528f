pub mod allowed;
pub mod custom_providers;
pub mod settings;

pub use allowed::{AllowListState, AllowedProviderFilter};
pub use custom_providers::CustomProviderService;
pub use settings::SettingsService;
