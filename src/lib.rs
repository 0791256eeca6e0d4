//! Aggregated API server bootstrap.
//!
//! Option groups are validated in a fixed order and applied onto a
//! [`ServerConfig`]. Outside dev mode secure serving is wired against an
//! in-memory listener and torn down again, so nothing listens on the network
//! and no authentication is installed.

pub mod auth;
pub mod config;
pub mod discovery;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod options;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use options::Options;
