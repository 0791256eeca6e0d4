//! Options for serving behind an API aggregator.

use std::path::PathBuf;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::options::{OptionGroup, ValidationError};

const FLAG_ALTERNATE_DNS: &str = "alternate-dns";
const FLAG_PROXY_CLIENT_CERT: &str = "proxy-client-cert-file";
const FLAG_PROXY_CLIENT_KEY: &str = "proxy-client-key-file";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct AggregatorOptions {
    /// Alternate DNS names for the serving certificate
    #[arg(long = "alternate-dns", value_name = "NAMES", value_delimiter = ',')]
    pub alternate_dns: Vec<String>,

    /// Client certificate used to prove the identity of the aggregator
    #[arg(long = "proxy-client-cert-file", value_name = "FILE")]
    pub proxy_client_cert_file: Option<PathBuf>,

    /// Private key for --proxy-client-cert-file
    #[arg(long = "proxy-client-key-file", value_name = "FILE")]
    pub proxy_client_key_file: Option<PathBuf>,
}

impl AggregatorOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionGroup for AggregatorOptions {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.proxy_client_cert_file.is_some() != self.proxy_client_key_file.is_some() {
            errors.push(ValidationError::SpecifiedTogether {
                first: FLAG_PROXY_CLIENT_CERT,
                second: FLAG_PROXY_CLIENT_KEY,
            });
        }

        for name in &self.alternate_dns {
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                errors.push(ValidationError::invalid(
                    FLAG_ALTERNATE_DNS,
                    format!("contains an invalid DNS name {:?}", name),
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Command, FromArgMatches};

    #[test]
    fn cert_and_key_go_together() {
        let opts = AggregatorOptions {
            proxy_client_cert_file: Some("client.crt".into()),
            ..Default::default()
        };
        assert_eq!(
            opts.validate(),
            [ValidationError::SpecifiedTogether {
                first: FLAG_PROXY_CLIENT_CERT,
                second: FLAG_PROXY_CLIENT_KEY,
            }]
        );
    }

    #[test]
    fn alternate_dns_from_comma_list() {
        let mut opts = AggregatorOptions::new();
        let matches = AggregatorOptions::augment_args(Command::new("test"))
            .try_get_matches_from(["test", "--alternate-dns", "a.local,b.local"])
            .unwrap();
        opts.update_from_arg_matches(&matches).unwrap();
        assert_eq!(opts.alternate_dns, ["a.local", "b.local"]);
        assert!(opts.validate().is_empty());
    }

    #[test]
    fn rejects_blank_dns_name() {
        let opts = AggregatorOptions {
            alternate_dns: vec!["ok.local".into(), "bad name".into()],
            ..Default::default()
        };
        assert_eq!(opts.validate().len(), 1);
    }
}
