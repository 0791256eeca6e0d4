//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum Router with discovery and health handlers
//! - Install authentication middleware when authentication was applied
//! - Serve on the secure-serving listener, if any
//! - Stop on the shutdown signal

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::auth::{authenticate, UserInfo, LOOPBACK_USER};
use crate::config::{AuthenticationInfo, SecureServingInfo, ServerConfig};
use crate::discovery::{ResourceManager, DISCOVERY_ROOT};
use crate::http::serve::ServingListener;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub discovery: Option<ResourceManager>,
}

/// HTTP server for the API server.
pub struct HttpServer {
    router: Router,
    secure_serving: Option<SecureServingInfo>,
}

impl HttpServer {
    /// Build the server from an applied configuration.
    pub fn new(config: ServerConfig) -> Self {
        let mut authn = config.authentication;

        // In-process clients authenticate with the loopback token.
        if let (Some(authenticator), Some(loopback)) = (
            authn.authenticator.as_mut(),
            config.loopback_client_config.as_ref(),
        ) {
            authenticator.add_token(
                loopback.bearer_token.clone(),
                UserInfo {
                    name: LOOPBACK_USER.to_string(),
                    uid: String::new(),
                    groups: vec!["system:masters".to_string()],
                },
            );
        }

        let discovery_path = format!(
            "/{}",
            config
                .aggregated_discovery_group_manager
                .as_ref()
                .map(ResourceManager::root)
                .unwrap_or(DISCOVERY_ROOT)
        );

        let state = AppState {
            discovery: config.aggregated_discovery_group_manager,
        };

        let router = Self::build_router(&discovery_path, state, authn);
        Self {
            router,
            secure_serving: config.secure_serving,
        }
    }

    fn build_router(discovery_path: &str, state: AppState, authn: AuthenticationInfo) -> Router {
        let router = Router::new()
            .route(discovery_path, get(discovery_handler))
            .route("/healthz", get(healthz_handler))
            .with_state(state);

        let router = if authn.is_configured() {
            router.layer(middleware::from_fn_with_state(Arc::new(authn), authenticate))
        } else {
            router
        };

        router.layer(TraceLayer::new_for_http())
    }

    /// The router, for dispatching requests in process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn is_serving(&self) -> bool {
        self.secure_serving.is_some()
    }

    /// Serve until `shutdown` fires. Without secure serving nothing is
    /// exposed on the network and this only waits for shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let signal = async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
        };

        match self.secure_serving {
            Some(serving) => {
                tracing::info!(
                    address = %serving.addr(),
                    certificate = serving.cert.is_some(),
                    "HTTP server starting"
                );
                axum::serve(ServingListener::new(serving.listener), self.router)
                    .with_graceful_shutdown(signal)
                    .await?;
            }
            None => {
                tracing::info!("Secure serving disabled, requests are served in process only");
                signal.await;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn discovery_handler(State(state): State<AppState>) -> Response {
    match state.discovery {
        Some(manager) => Json(manager.discovery_document()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn healthz_handler() -> &'static str {
    "ok"
}
