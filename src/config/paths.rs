//! Canonical default locations for redd-harvest.
//!
//! Single source of truth - import this instead of hardcoding paths.
//!
//! | Location | Default |
//! |----------|---------|
//! | Config file | `~/.config/redd-harvest/config.yml` |
//! | Download folder | `~/.redd-harvest/data` |

use std::path::{Path, PathBuf};

use super::ConfigError;

/// Env var naming an alternative config file
pub const CONFIG_ENV: &str = "REDD_HARVEST_CONFIG";

/// Env var overriding `globals.download_folder`
pub const DOWNLOAD_FOLDER_ENV: &str = "REDD_HARVEST_DOWNLOAD_FOLDER";

/// Default download folder before `~` expansion
pub const DEFAULT_DOWNLOAD_FOLDER: &str = "~/.redd-harvest/data";

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeDir)
}

/// Get the default config file path (~/.config/redd-harvest/config.yml)
pub fn default_config_file() -> Result<PathBuf, ConfigError> {
    Ok(home()?.join(".config").join("redd-harvest").join("config.yml"))
}

/// Config file to use when none is passed explicitly ($REDD_HARVEST_CONFIG or the default)
pub fn config_file() -> Result<PathBuf, ConfigError> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.trim().is_empty() => expand_home(path.trim()),
        _ => default_config_file(),
    }
}

/// Expand a leading `~` and make the path absolute against the current directory
pub fn expand_home(path: &str) -> Result<PathBuf, ConfigError> {
    let expanded = if path == "~" {
        home()?
    } else if let Some(rest) = path.strip_prefix("~/") {
        home()?.join(rest)
    } else {
        PathBuf::from(path)
    };

    Ok(absolute(&expanded))
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
