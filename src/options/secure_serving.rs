//! Secure serving options.
//!
//! # Responsibilities
//! - Resolve the listener: a caller supplied one, or a freshly bound socket
//! - Load the serving certificate pair, when configured
//! - Derive the loopback client configuration from the listener address

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{LoopbackClientConfig, SecureServingInfo};
use crate::net::tls::load_serving_cert;
use crate::net::{Listener, TcpListener};
use crate::options::{ApplyError, OptionGroup, ValidationError};

const FLAG_SECURE_PORT: &str = "secure-port";
const FLAG_TLS_CERT: &str = "tls-cert-file";
const FLAG_TLS_KEY: &str = "tls-private-key-file";

/// Default `--secure-port`.
pub const DEFAULT_SECURE_PORT: u16 = 6443;

#[derive(Debug, Clone, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct SecureServingOptions {
    /// IP address to listen on for --secure-port
    #[arg(long = "bind-address", value_name = "IP", required = false)]
    pub bind_address: IpAddr,

    /// Port to serve HTTPS with authentication on. 0 disables secure
    /// serving unless it is required
    #[arg(long = "secure-port", value_name = "PORT", required = false)]
    pub bind_port: u16,

    /// Whether secure serving may be turned off with port 0.
    #[arg(skip)]
    pub required: bool,

    /// PEM serving certificate chain
    #[arg(long = "tls-cert-file", value_name = "FILE")]
    pub cert_file: Option<PathBuf>,

    /// PEM private key matching --tls-cert-file
    #[arg(long = "tls-private-key-file", value_name = "FILE")]
    pub key_file: Option<PathBuf>,

    /// Listener to serve on instead of binding `bind_address:bind_port`.
    /// Consumed by `apply_to`.
    #[serde(skip)]
    #[arg(skip)]
    pub listener: Option<Arc<dyn Listener>>,
}

impl Default for SecureServingOptions {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            bind_port: DEFAULT_SECURE_PORT,
            required: true,
            cert_file: None,
            key_file: None,
            listener: None,
        }
    }
}

impl SecureServingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate secure serving and the matching loopback client config.
    ///
    /// With no listener set and port 0, secure serving stays disabled.
    pub async fn apply_to(
        &mut self,
        secure_serving: &mut Option<SecureServingInfo>,
        loopback: &mut Option<LoopbackClientConfig>,
    ) -> Result<(), ApplyError> {
        if self.listener.is_none() && self.bind_port == 0 {
            tracing::info!("Secure serving disabled, no listener and port 0");
            return Ok(());
        }

        let cert = match (&self.cert_file, &self.key_file) {
            (Some(cert), Some(key)) => {
                Some(load_serving_cert(cert, key).map_err(ApplyError::Certificate)?)
            }
            _ => None,
        };

        let listener: Arc<dyn Listener> = match self.listener.take() {
            Some(listener) => listener,
            None => {
                let addr = SocketAddr::new(self.bind_address, self.bind_port);
                let listener = TcpListener::bind(addr)
                    .await
                    .map_err(|source| ApplyError::Bind { addr, source })?;
                Arc::new(listener)
            }
        };

        let addr = listener.addr();
        *loopback = Some(LoopbackClientConfig {
            host: loopback_host(addr),
            bearer_token: Uuid::new_v4().to_string(),
        });
        *secure_serving = Some(SecureServingInfo { listener, cert });

        tracing::debug!(address = %addr, "Secure serving configured");
        Ok(())
    }
}

/// `https://` URL that reaches `addr` from inside this process.
fn loopback_host(addr: SocketAddr) -> String {
    let ip = match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    format!("https://{}", SocketAddr::new(ip, addr.port()))
}

impl OptionGroup for SecureServingOptions {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.required && self.bind_port == 0 {
            errors.push(ValidationError::invalid(
                FLAG_SECURE_PORT,
                "0 must be between 1 and 65535, inclusive. It cannot be turned off with 0",
            ));
        }

        if self.cert_file.is_some() != self.key_file.is_some() {
            errors.push(ValidationError::SpecifiedTogether {
                first: FLAG_TLS_CERT,
                second: FLAG_TLS_KEY,
            });
        }

        errors
    }
}
