//! Tool configuration stored as JSON in the user's home directory.

use std::fs;
use std::path::{Path, PathBuf};

use lambda_watch_core::WatchSettings;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

pub const CONFIG_DIR_NAME: &str = ".lambda_watch";
pub const CONFIG_FILE_NAME: &str = "conf.json";
pub const DEFAULT_REGION: &str = "us-west-2";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source_path: PathBuf,
    pub deploy_path: PathBuf,
    pub aws: AwsSettings,
    /// Values substituted into event templates.
    pub variables: Map<String, Value>,
    pub watch: WatchSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("."),
            deploy_path: PathBuf::from("/tmp"),
            aws: AwsSettings::default(),
            variables: Map::new(),
            watch: WatchSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSettings {
    pub region: String,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot determine home directory for the default configuration path")]
    NoHomeDirectory,
    #[error("failed to access configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoHomeDirectory)
}

/// Reads the configuration at `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match read_json(path)? {
        Some(value) => serde_json::from_value(value).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            warn!(path = %path.display(), "configuration_missing_using_defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Writes the default configuration to `path`, keeping every value already
/// present in an existing file.
pub fn init_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    let parse_error = |source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let mut merged = serde_json::to_value(AppConfig::default()).map_err(parse_error)?;
    if let Some(existing) = read_json(path)? {
        overlay(&mut merged, existing);
    }
    let config: AppConfig = serde_json::from_value(merged).map_err(parse_error)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let text = serde_json::to_string_pretty(&config).map_err(parse_error)?;
    fs::write(path, text).map_err(io_error)?;
    Ok(config)
}

fn read_json(path: &Path) -> Result<Option<Value>, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base), Value::Object(top)) => {
            for (key, value) in top {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
