//! The per-function `lambda.json` descriptor.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FUNCTION_CONFIG_FILE: &str = "lambda.json";
pub const DEFAULT_RUNTIME: &str = "nodejs20.x";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionConfig {
    pub function_name: String,
    pub role: String,
    pub handler: String,
    #[serde(default = "default_runtime")]
    pub runtime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Error)]
pub enum FunctionConfigError {
    #[error("failed to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn default_runtime() -> String {
    DEFAULT_RUNTIME.to_string()
}

pub fn load_function_config(path: &Path) -> Result<FunctionConfig, FunctionConfigError> {
    let text = fs::read_to_string(path).map_err(|source| FunctionConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| FunctionConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
