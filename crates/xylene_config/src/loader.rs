//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::XyleneConfig;
use std::path::{Path, PathBuf};

/// The file name looked up by [`find_config`].
pub const CONFIG_FILE_NAME: &str = "xylene.toml";

/// Returns `<dir>/xylene.toml` if it exists.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    let candidate = dir.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

/// Loads and validates a configuration file.
///
/// A relative `database.path` is resolved against the file's directory.
pub fn load_config(path: &Path) -> Result<XyleneConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = load_config_from_str(&content)?;
    if let (Some(db), Some(base)) = (config.database.path.as_mut(), path.parent()) {
        if db.is_relative() {
            *db = base.join(&*db);
        }
    }
    Ok(config)
}

/// Parses and validates a `xylene.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<XyleneConfig, ConfigError> {
    let config: XyleneConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are consistent.
fn validate_config(config: &XyleneConfig) -> Result<(), ConfigError> {
    if config.decode.frame_words == Some(0) {
        return Err(ConfigError::ValidationError(
            "decode.frame_words must be positive".to_string(),
        ));
    }
    if config.decode.sync_window.bytes() < 4 {
        return Err(ConfigError::ValidationError(format!(
            "decode.sync_window of {} cannot hold a sync word",
            config.decode.sync_window
        )));
    }
    if let Some(path) = &config.database.path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.path is empty".to_string(),
            ));
        }
    }
    Ok(())
}
