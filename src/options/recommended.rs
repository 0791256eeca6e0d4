//! The standard serving option set: secure serving, authentication and etcd.

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::options::authentication::AuthenticationOptions;
use crate::options::etcd::{EtcdOptions, DEFAULT_ETCD_PATH_PREFIX};
use crate::options::secure_serving::SecureServingOptions;
use crate::options::{OptionGroup, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct RecommendedOptions {
    #[command(flatten)]
    pub secure_serving: SecureServingOptions,
    #[command(flatten)]
    pub authentication: AuthenticationOptions,
    #[command(flatten)]
    pub etcd: EtcdOptions,
}

impl RecommendedOptions {
    pub fn new(etcd_prefix: impl Into<String>) -> Self {
        Self {
            secure_serving: SecureServingOptions::new(),
            authentication: AuthenticationOptions::new(),
            etcd: EtcdOptions::new(etcd_prefix),
        }
    }
}

impl Default for RecommendedOptions {
    fn default() -> Self {
        Self::new(DEFAULT_ETCD_PATH_PREFIX)
    }
}

impl OptionGroup for RecommendedOptions {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = self.secure_serving.validate();
        errors.extend(self.authentication.validate());
        errors.extend(self.etcd.validate());
        errors
    }
}
