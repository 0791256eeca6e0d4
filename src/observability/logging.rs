//! Structured logging.
//!
//! # Responsibilities
//! - Map `--verbosity` onto a tracing level
//! - Initialize the global subscriber once, at startup

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Level for a `--verbosity` value: 0-1 info, 2-4 debug, 5+ trace.
pub fn level_for_verbosity(verbosity: u8) -> Level {
    match verbosity {
        0..=1 => Level::INFO,
        2..=4 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(verbosity: u8) -> String {
    let level = level_for_verbosity(verbosity).as_str().to_ascii_lowercase();
    format!("aggregated_apiserver={level},tower_http={level},warn")
}

/// Install the global subscriber.
pub fn init_logging(verbosity: u8) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
