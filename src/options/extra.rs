//! Server specific options, including the dev mode switch.

use clap::{ArgAction, Args};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ServerConfig;
use crate::options::{ApplyError, OptionGroup, ValidationError};

const FLAG_HOST: &str = "apiserver-host";
const FLAG_API_URL: &str = "apiserver-api-url";
const FLAG_VERBOSITY: &str = "verbosity";

/// Highest accepted `--verbosity`.
pub const MAX_VERBOSITY: u8 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct ExtraOptions {
    /// Serve on the configured secure port with authentication enabled
    #[arg(
        long = "apiserver-dev-mode",
        value_name = "BOOL",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
        required = false
    )]
    pub dev_mode: bool,

    /// Host name advertised to clients
    #[arg(long = "apiserver-host", value_name = "HOST", required = false)]
    pub external_address: String,

    /// URL the surrounding application is reachable at
    #[arg(long = "apiserver-api-url", value_name = "URL", required = false)]
    pub api_url: String,

    /// Log verbosity, 0-10
    #[arg(long = "verbosity", value_name = "LEVEL", required = false)]
    pub verbosity: u8,
}

impl ExtraOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_to(&self, config: &mut ServerConfig) -> Result<(), ApplyError> {
        if !self.external_address.is_empty() {
            config.external_address = Some(self.external_address.clone());
        }

        if !self.api_url.is_empty() {
            match Url::parse(&self.api_url) {
                Ok(url) => config.api_url = Some(url),
                Err(e) => tracing::warn!(api_url = %self.api_url, error = %e, "Ignoring unparsable API URL"),
            }
        }

        Ok(())
    }
}

impl OptionGroup for ExtraOptions {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.external_address.contains("://")
            || self.external_address.chars().any(char::is_whitespace)
        {
            errors.push(ValidationError::invalid(
                FLAG_HOST,
                format!("must be a bare host name, got {:?}", self.external_address),
            ));
        }

        if !self.api_url.is_empty() {
            match Url::parse(&self.api_url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(url) => errors.push(ValidationError::invalid(
                    FLAG_API_URL,
                    format!("must use http or https, got {}", url.scheme()),
                )),
                Err(e) => errors.push(ValidationError::invalid(
                    FLAG_API_URL,
                    format!("must be a valid URL: {}", e),
                )),
            }
        }

        if self.verbosity > MAX_VERBOSITY {
            errors.push(ValidationError::invalid(
                FLAG_VERBOSITY,
                format!("must be at most {}", MAX_VERBOSITY),
            ));
        }

        errors
    }
}
