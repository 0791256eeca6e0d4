//! Options loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::options::Options;

/// Error type for options file loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load options from a TOML file. Values are not validated here.
pub fn load_options(path: &Path) -> Result<Options, ConfigError> {
    let content = fs::read_to_string(path)?;
    let options: Options = toml::from_str(&content)?;

    tracing::debug!(path = ?path, "Options file loaded");
    Ok(options)
}
