//! Option validation and apply errors.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// A configuration problem found while validating one option group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The flag has a value that is not acceptable.
    #[error("--{flag} {reason}")]
    Invalid { flag: &'static str, reason: String },

    /// A required flag was not given.
    #[error("--{flag} must be specified")]
    Missing { flag: &'static str },

    /// Two flags that only make sense as a pair were not both given.
    #[error("--{first} and --{second} must be specified together")]
    SpecifiedTogether {
        first: &'static str,
        second: &'static str,
    },
}

impl ValidationError {
    pub fn invalid(flag: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::Invalid {
            flag,
            reason: reason.into(),
        }
    }

    /// The flag the error is reported against.
    pub fn flag(&self) -> &'static str {
        match self {
            ValidationError::Invalid { flag, .. } | ValidationError::Missing { flag } => flag,
            ValidationError::SpecifiedTogether { first, .. } => first,
        }
    }
}

/// Failure while applying options to the server configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("failed to create listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to load serving certificate: {0}")]
    Certificate(#[source] io::Error),

    #[error("failed to read token file {path:?}: {source}")]
    TokenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("token file {path:?} line {line}: {reason}")]
    TokenFileFormat {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// Closing the in-memory listener failed. Carries the close error as is.
    #[error(transparent)]
    Listener(io::Error),
}
