pub mod types;

use crate::error::ConfigError;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".kubesweep.toml";

/// Get the global config file path (~/.kubesweep.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Load configuration from `path`, or from the global file when no path is given.
///
/// A missing file yields defaults. A file that exists but cannot be parsed is an error.
pub fn load_config(path: Option<&Path>) -> Result<types::Config, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match global_config_path() {
            Some(global) => global,
            None => return Ok(types::Config::default()),
        },
    };

    if !path.exists() {
        debug!("No config at {}; using defaults", path.display());
        return Ok(types::Config::default());
    }

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::ParsingFailed(e.to_string()))
}

/// Save configuration to `path`, or to the global file when no path is given.
pub fn save_config(config: &types::Config, path: Option<&Path>) -> Result<(), ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => global_config_path().ok_or(ConfigError::NoHomeDirectory)?,
    };
    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::ParsingFailed(e.to_string()))?;
    fs::write(&path, content).map_err(|e| ConfigError::WriteFailed(e.to_string()))?;
    debug!("Saved config to {}", path.display());
    Ok(())
}
