//! Application service: configuration use-cases.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::{StackConfig, apply_config_value};

/// Load configuration.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(store: &impl ConfigStore) -> Result<StackConfig> {
    store.load()
}

/// Save configuration.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_config(store: &impl ConfigStore, config: &StackConfig) -> Result<()> {
    store.save(config)
}

/// Validate and persist one `key = value` setting, returning the new config.
///
/// Nothing is written when the key or value is rejected.
///
/// # Errors
///
/// Returns a [`crate::domain::error::ConfigError`] for an unknown key or an
/// invalid value, or an I/O error from the store.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<StackConfig> {
    let mut config = store.load()?;
    apply_config_value(&mut config, key, value)?;
    store.save(&config)?;
    tracing::info!(key, value, "configuration updated");
    Ok(config)
}

/// Resolve the bastion boot script against the config file's directory.
///
/// # Errors
///
/// Returns an error if the store cannot report its path.
pub fn user_data_path(store: &impl ConfigStore, config: &StackConfig) -> Result<PathBuf> {
    let script = PathBuf::from(&config.bastion.user_data);
    if script.is_absolute() {
        return Ok(script);
    }
    let config_path = store.path()?;
    Ok(config_path
        .parent()
        .map_or_else(|| script.clone(), |dir| dir.join(&script)))
}
