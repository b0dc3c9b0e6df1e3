//! Configuration file loading.

use crate::config::types::ProviderConfig;
use crate::error::ProviderError;
use std::path::{Path, PathBuf};

/// Default configuration file name for project-local config.
const LOCAL_CONFIG_NAME: &str = "acton-script-agents.toml";

/// Default configuration file name within XDG config directory.
const XDG_CONFIG_NAME: &str = "config.toml";

/// Application name for XDG directory lookup.
const APP_NAME: &str = "acton-script-agents";

/// Loads configuration from the default search paths.
///
/// Search order:
/// 1. `./acton-script-agents.toml` (project-local)
/// 2. `~/.config/acton-script-agents/config.toml` (XDG config)
///
/// Returns the default configuration if no config file is found.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be parsed.
pub fn load() -> Result<ProviderConfig, ProviderError> {
    for path in search_paths() {
        if path.exists() {
            tracing::debug!(path = %path.display(), "Loading configuration");
            return from_path(&path);
        }
    }

    Ok(ProviderConfig::default())
}

/// Loads configuration from a specific file path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not contain a
/// valid configuration.
pub fn from_path(path: &Path) -> Result<ProviderConfig, ProviderError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ProviderError::configuration(
            "config_file",
            format!("failed to read '{}': {}", path.display(), e),
        )
    })?;

    from_str(&contents).map_err(|e| {
        ProviderError::configuration(
            "config_file",
            format!("failed to parse '{}': {}", path.display(), e),
        )
    })
}

/// Parses configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or doesn't match the schema.
pub fn from_str(toml_str: &str) -> Result<ProviderConfig, ProviderError> {
    toml::from_str(toml_str)
        .map_err(|e| ProviderError::configuration("config", format!("invalid TOML: {e}")))
}

/// Returns the paths that would be searched for configuration files.
#[must_use]
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_NAME)];

    if let Some(config_dir) = xdg_config_dir() {
        paths.push(config_dir.join(XDG_CONFIG_NAME));
    }

    paths
}

/// Returns the XDG config directory for this crate.
///
/// This is `~/.config/acton-script-agents` on most systems.
#[must_use]
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_NAME))
}
