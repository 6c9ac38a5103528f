//! Configuration loading

use anyhow::Result;
use std::path::Path;

use crate::Config;

/// Load configuration from a config file and environment variables
///
/// Config file search order:
/// 1. `explicit` path (command line)
/// 2. OEMBED_CONFIG_PATH environment variable
/// 3. ./config.yaml (current working directory)
/// 4. Fall back to environment variables only
///
/// Runs before logging is initialized, so every validation error is carried
/// in the returned error rather than logged.
pub fn load_config(explicit: Option<&str>) -> Result<Config> {
    let config_path = explicit
        .map(str::to_string)
        .or_else(|| {
            std::env::var("OEMBED_CONFIG_PATH")
                .ok()
                .filter(|p| Path::new(p).exists())
        })
        .or_else(|| {
            let cwd = "config.yaml";
            Path::new(cwd).exists().then(|| cwd.to_string())
        });

    let config = match config_path {
        Some(path) => {
            if !Path::new(&path).exists() {
                anyhow::bail!("Config file not found: {path}");
            }
            Config::from_file(&path).map_err(|e| anyhow::anyhow!("Failed to load {path}: {e}"))?
        }
        None => Config::from_env()?,
    };

    // Fail fast on misconfigurations
    if let Err(errors) = config.validate() {
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        ));
    }

    Ok(config)
}
