//! Storage backend selection.

use std::fmt;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::options::{OptionGroup, ValidationError};

const FLAG_STORAGE_PATH: &str = "apiserver-storage-path";
const FLAG_STORAGE_ADDRESS: &str = "apiserver-storage-address";

/// Where API objects are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StorageType {
    /// Files under a local data directory.
    File,
    /// An etcd cluster, configured by the etcd options.
    Etcd,
    /// The application's existing database.
    #[default]
    Legacy,
    /// Unified storage in process.
    Unified,
    /// Unified storage over gRPC.
    UnifiedGrpc,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::File => "file",
            StorageType::Etcd => "etcd",
            StorageType::Legacy => "legacy",
            StorageType::Unified => "unified",
            StorageType::UnifiedGrpc => "unified-grpc",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct StorageOptions {
    /// Storage backend for API objects
    #[arg(long = "apiserver-storage-type", value_name = "TYPE", value_enum, required = false)]
    pub storage_type: StorageType,

    /// Data directory for file storage
    #[arg(long = "apiserver-storage-path", value_name = "DIR")]
    pub data_path: Option<PathBuf>,

    /// Storage server address (host:port)
    #[arg(long = "apiserver-storage-address", value_name = "HOST:PORT", required = false)]
    pub address: String,
}

impl StorageOptions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            storage_type: StorageType::default(),
            data_path: None,
            address: "localhost:10000".to_string(),
        }
    }
}

/// Checks `host:port`, including bracketed IPv6 hosts.
fn check_host_port(address: &str) -> Result<(), String> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| format!("missing port in address {:?}", address))?;
    if host.trim_start_matches('[').trim_end_matches(']').is_empty() {
        return Err(format!("missing host in address {:?}", address));
    }
    port.parse::<u16>()
        .map(|_| ())
        .map_err(|_| format!("invalid port {:?} in address {:?}", port, address))
}

impl OptionGroup for StorageOptions {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Err(reason) = check_host_port(&self.address) {
            errors.push(ValidationError::invalid(
                FLAG_STORAGE_ADDRESS,
                format!("must be a valid network address: {}", reason),
            ));
        }

        let has_path = self
            .data_path
            .as_ref()
            .is_some_and(|p| !p.as_os_str().is_empty());
        if self.storage_type == StorageType::File && !has_path {
            errors.push(ValidationError::Missing {
                flag: FLAG_STORAGE_PATH,
            });
        }

        errors
    }
}
