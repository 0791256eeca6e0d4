//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! options file (TOML, optional)
//!     → loader.rs (parse & deserialize into Options)
//!     → command-line flags override file values
//!     → Options::validate / Options::apply_to
//!     → ServerConfig (schema.rs)
//!     → moved into the HTTP server
//! ```
//!
//! # Design Decisions
//! - All option fields have defaults to allow minimal files
//! - Loading is syntactic only; semantic checks belong to the option groups
//! - ServerConfig is mutated only during startup, never after serving begins

pub mod loader;
pub mod schema;

pub use loader::{load_options, ConfigError};
pub use schema::{
    AuthenticationInfo, LoopbackClientConfig, OpenApiConfig, SecureServingInfo, SecurityScheme,
    ServerConfig,
};
