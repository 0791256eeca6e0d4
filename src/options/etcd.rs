//! etcd connection options. Validated only when etcd is the storage type.

use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::options::{OptionGroup, ValidationError};

const FLAG_ETCD_SERVERS: &str = "etcd-servers";
const FLAG_ETCD_PREFIX: &str = "etcd-prefix";

/// Key prefix objects are stored under by default.
pub const DEFAULT_ETCD_PATH_PREFIX: &str = "/registry/aggregated.app";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct EtcdOptions {
    /// etcd servers to connect to (scheme://ip:port), comma separated
    #[arg(long = "etcd-servers", value_name = "URLS", value_delimiter = ',')]
    pub servers: Vec<String>,

    /// Prefix to prepend to all resource paths in etcd
    #[arg(long = "etcd-prefix", value_name = "PREFIX", required = false)]
    pub prefix: String,
}

impl Default for EtcdOptions {
    fn default() -> Self {
        Self::new(DEFAULT_ETCD_PATH_PREFIX)
    }
}

impl EtcdOptions {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            servers: Vec::new(),
            prefix: prefix.into(),
        }
    }
}

impl OptionGroup for EtcdOptions {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.servers.is_empty() {
            errors.push(ValidationError::Missing {
                flag: FLAG_ETCD_SERVERS,
            });
        }

        for server in &self.servers {
            let valid = Url::parse(server)
                .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
                .unwrap_or(false);
            if !valid {
                errors.push(ValidationError::invalid(
                    FLAG_ETCD_SERVERS,
                    format!("{:?} is not an http or https URL", server),
                ));
            }
        }

        if !self.prefix.starts_with('/') {
            errors.push(ValidationError::invalid(
                FLAG_ETCD_PREFIX,
                format!("{:?} must start with /", self.prefix),
            ));
        }

        errors
    }
}
