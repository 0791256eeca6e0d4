//! Serving certificate loading.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// A certificate/key pair that has been read and parsed from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServingCert {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
    /// Number of certificates in the chain.
    pub chain_len: usize,
}

/// Load and check a PEM certificate chain and its private key.
pub fn load_serving_cert(cert_path: &Path, key_path: &Path) -> Result<ServingCert, io::Error> {
    if !cert_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Certificate file not found: {:?}", cert_path),
        ));
    }
    if !key_path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Private key file not found: {:?}", key_path),
        ));
    }

    let mut reader = BufReader::new(File::open(cert_path)?);
    let chain = rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;
    if chain.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("No certificates found in {:?}", cert_path),
        ));
    }

    let mut reader = BufReader::new(File::open(key_path)?);
    if rustls_pemfile::private_key(&mut reader)?.is_none() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("No private key found in {:?}", key_path),
        ));
    }

    Ok(ServingCert {
        cert_file: cert_path.to_path_buf(),
        key_file: key_path.to_path_buf(),
        chain_len: chain.len(),
    })
}
