//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//! HTTP layer:
//!     → tower-http TraceLayer spans per request
//! Consumers:
//!     → logging.rs subscriber (stdout)
//! ```
//!
//! # Design Decisions
//! - `--verbosity` picks the default level, `RUST_LOG` overrides it

pub mod logging;

pub use logging::{default_directive, init_logging};
