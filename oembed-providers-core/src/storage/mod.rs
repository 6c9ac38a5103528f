// Persistent storage for custom providers and settings

pub mod custom_providers;
pub mod entity;
pub mod settings;

pub use custom_providers::{CustomProviderStore, MemoryCustomProviderStore, YamlCustomProviderStore};
pub use entity::{is_machine_name, CustomEndpoint, CustomProvider};
pub use settings::{MemorySettingsStore, Settings, SettingsStore, YamlSettingsStore, SETTINGS_FILE};
