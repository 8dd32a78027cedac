//! Configuration loading
//!
//! Reads a JSON5 file from `$TEAMFEED_CONFIG_PATH` or the platform config
//! directory. A missing file is not an error and yields the defaults.

pub mod types;

pub use types::Config;

use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "TEAMFEED_CONFIG_PATH";

/// Config error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Resolved config file path
pub fn get_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("teamfeed")
        .join("config.json5")
}

/// Load the config from the resolved path
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load the config from `path`, falling back to defaults when it is absent
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_config(&raw).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse JSON5 config text
pub fn parse_config(raw: &str) -> Result<Config, String> {
    json5::from_str(raw).map_err(|e| e.to_string())
}

/// Navigate a config by dot-notation path, e.g. `feed.defaultLimit`
pub fn get_value_at_path(config: &Config, path: &str) -> Option<Value> {
    let root = serde_json::to_value(config).ok()?;
    let mut current = &root;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current.clone())
}
