//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfig.secure_serving
//!     → serve.rs (adapts net::Listener to axum's accept loop)
//!     → server.rs (router, auth middleware, handlers)
//!     → /apis (aggregated discovery), /healthz
//!
//! No secure serving (production):
//!     → router only reachable in process via HttpServer::router()
//! ```

pub mod serve;
pub mod server;

pub use serve::ServingListener;
pub use server::HttpServer;
