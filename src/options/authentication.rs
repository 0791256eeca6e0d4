//! Request authentication options. Only validated and applied in dev mode.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args};
use serde::{Deserialize, Serialize};

use crate::auth::TokenAuthenticator;
use crate::config::{AuthenticationInfo, OpenApiConfig, SecureServingInfo, SecurityScheme};
use crate::options::{ApplyError, OptionGroup, ValidationError};

const FLAG_TOKEN_FILE: &str = "token-auth-file";
const FLAG_CLIENT_CA: &str = "client-ca-file";
const FLAG_CACHE_TTL: &str = "authentication-token-cache-ttl";

const MAX_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Name of the OpenAPI security definition added on apply.
pub const BEARER_SECURITY_DEFINITION: &str = "BearerToken";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct AuthenticationOptions {
    /// Static bearer tokens for dev mode authentication, one
    /// `token,user,uid[,"groups"]` record per line
    #[arg(long = "token-auth-file", value_name = "FILE")]
    pub token_auth_file: Option<PathBuf>,

    /// CA bundle used to verify client certificates
    #[arg(long = "client-ca-file", value_name = "FILE")]
    pub client_ca_file: Option<PathBuf>,

    /// Allow requests that carry no credentials
    #[arg(long = "anonymous-auth", value_name = "BOOL", action = ArgAction::Set, required = false)]
    pub anonymous: bool,

    /// How long to cache token review results, in seconds
    #[arg(long = "authentication-token-cache-ttl", value_name = "SECONDS", required = false)]
    pub token_cache_ttl_secs: u64,
}

impl Default for AuthenticationOptions {
    fn default() -> Self {
        Self {
            token_auth_file: None,
            client_ca_file: None,
            anonymous: false,
            token_cache_ttl_secs: 10,
        }
    }
}

impl AuthenticationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an authenticator and register the bearer token scheme on the
    /// OpenAPI config. Without secure serving only the serving address is
    /// left out; client certificates have nothing to be verified against.
    pub fn apply_to(
        &self,
        authn: &mut AuthenticationInfo,
        secure_serving: Option<&SecureServingInfo>,
        open_api: Option<&mut OpenApiConfig>,
    ) -> Result<(), ApplyError> {
        let authenticator = match &self.token_auth_file {
            Some(path) => TokenAuthenticator::from_file(path)?,
            None => TokenAuthenticator::new(),
        };

        match secure_serving {
            Some(serving) => tracing::info!(
                address = %serving.addr(),
                tokens = authenticator.len(),
                anonymous = self.anonymous,
                "Authentication configured"
            ),
            None => {
                if self.client_ca_file.is_some() {
                    tracing::warn!("Client CA file ignored without secure serving");
                }
                tracing::info!(
                    tokens = authenticator.len(),
                    anonymous = self.anonymous,
                    "Authentication configured without secure serving"
                );
            }
        }

        authn.authenticator = Some(authenticator);
        authn.anonymous = self.anonymous;
        authn.client_ca_file = secure_serving.and(self.client_ca_file.clone());
        authn.token_cache_ttl = Duration::from_secs(self.token_cache_ttl_secs);

        if let Some(open_api) = open_api {
            open_api
                .security_definitions
                .insert(BEARER_SECURITY_DEFINITION.to_string(), SecurityScheme::bearer_token());
        }

        Ok(())
    }
}

impl OptionGroup for AuthenticationOptions {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for (flag, path) in [
            (FLAG_TOKEN_FILE, &self.token_auth_file),
            (FLAG_CLIENT_CA, &self.client_ca_file),
        ] {
            if let Some(path) = path {
                if !path.is_file() {
                    errors.push(ValidationError::invalid(
                        flag,
                        format!("file {:?} does not exist", path),
                    ));
                }
            }
        }

        if self.token_cache_ttl_secs > MAX_CACHE_TTL_SECS {
            errors.push(ValidationError::invalid(
                FLAG_CACHE_TTL,
                format!("must be at most {} seconds", MAX_CACHE_TTL_SECS),
            ));
        }

        errors
    }
}
