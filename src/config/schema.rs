//! Server configuration.
//!
//! [`ServerConfig`] is what the options are applied onto and what the HTTP
//! layer consumes. It is built once at startup, passed by `&mut` into
//! `Options::apply_to`, then moved into the server.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::TokenAuthenticator;
use crate::discovery::ResourceManager;
use crate::net::tls::ServingCert;
use crate::net::Listener;

/// Configuration consumed by the HTTP layer.
#[derive(Debug)]
pub struct ServerConfig {
    /// Aggregated discovery registry served at `/apis`.
    pub aggregated_discovery_group_manager: Option<ResourceManager>,

    /// Secure serving. `None` means nothing listens on the network.
    pub secure_serving: Option<SecureServingInfo>,

    /// How in-process clients reach this server.
    pub loopback_client_config: Option<LoopbackClientConfig>,

    /// Request authentication. Left empty unless applied.
    pub authentication: AuthenticationInfo,

    pub open_api_config: Option<OpenApiConfig>,

    /// Host name advertised to clients.
    pub external_address: Option<String>,

    /// URL the surrounding application is reachable at.
    pub api_url: Option<Url>,
}

impl ServerConfig {
    pub fn new() -> Self {
        Self {
            aggregated_discovery_group_manager: None,
            secure_serving: None,
            loopback_client_config: None,
            authentication: AuthenticationInfo::default(),
            open_api_config: Some(OpenApiConfig::default()),
            external_address: None,
            api_url: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Applied secure serving state.
#[derive(Debug, Clone)]
pub struct SecureServingInfo {
    /// The listener requests are served from.
    pub listener: Arc<dyn Listener>,

    /// Serving certificate, when one was configured.
    pub cert: Option<ServingCert>,
}

impl SecureServingInfo {
    pub fn addr(&self) -> SocketAddr {
        self.listener.addr()
    }
}

/// Client configuration for talking to this server from inside the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopbackClientConfig {
    pub host: String,
    pub bearer_token: String,
}

/// Applied authentication state.
#[derive(Debug, Clone, Default)]
pub struct AuthenticationInfo {
    pub authenticator: Option<TokenAuthenticator>,

    /// Allow requests without credentials.
    pub anonymous: bool,

    pub client_ca_file: Option<PathBuf>,

    pub token_cache_ttl: Duration,
}

impl AuthenticationInfo {
    pub fn is_configured(&self) -> bool {
        self.authenticator.is_some()
    }
}

/// OpenAPI document settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenApiConfig {
    pub title: String,
    pub version: String,
    pub security_definitions: BTreeMap<String, SecurityScheme>,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            title: "aggregated-apiserver".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            security_definitions: BTreeMap::new(),
        }
    }
}

/// An OpenAPI security scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub description: String,
}

impl SecurityScheme {
    /// `Authorization: Bearer <token>` header scheme.
    pub fn bearer_token() -> Self {
        Self {
            scheme_type: "apiKey".to_string(),
            name: "authorization".to_string(),
            location: "header".to_string(),
            description: "Bearer Token authentication".to_string(),
        }
    }
}
