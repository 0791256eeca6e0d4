//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Flags/file → Options::validate → Options::apply_to → HttpServer
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → HTTP server drains and exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any validation or apply error is fatal
//! - Listeners are only created by apply, never before validation passes

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
