//! Aggregated API server.
//!
//! ```text
//! flags (+ optional --config file)
//!     → Options::validate     fail: log every error, exit 1
//!     → Options::apply_to     fail: exit with the error
//!     → HttpServer::run       until SIGINT/SIGTERM
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, FromArgMatches, Parser};

use aggregated_apiserver::config::{load_options, ServerConfig};
use aggregated_apiserver::lifecycle::signals::wait_for_signal;
use aggregated_apiserver::observability::init_logging;
use aggregated_apiserver::{HttpServer, Options, Shutdown};

/// Aggregated API server
#[derive(Parser, Debug)]
#[command(name = "aggregated-apiserver", version, about)]
struct Cli {
    /// TOML options file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let matches = Options::add_flags(Cli::command()).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let (mut options, load_error) = match &cli.config {
        Some(path) => match load_options(path) {
            Ok(options) => (options, None),
            Err(e) => (Options::new(), Some(e)),
        },
        None => (Options::new(), None),
    };
    if let Err(e) = options.read_flags(&matches) {
        e.exit();
    }

    // With a broken options file this is the flag verbosity alone.
    init_logging(options.extra.verbosity);

    if let Some(e) = load_error {
        tracing::error!(path = ?cli.config, error = %e, "Failed to load options file");
        return Ok(ExitCode::FAILURE);
    }
    if let Some(path) = &cli.config {
        tracing::info!(path = ?path, "Options file loaded");
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        dev_mode = options.extra.dev_mode,
        storage_type = %options.storage.storage_type,
        "aggregated-apiserver starting"
    );

    let errors = options.validate();
    if !errors.is_empty() {
        for error in &errors {
            tracing::error!(error = %error, "Invalid option");
        }
        return Ok(ExitCode::FAILURE);
    }

    let mut server_config = ServerConfig::new();
    if let Err(e) = options.apply_to(&mut server_config).await {
        tracing::error!(error = %e, "Failed to apply options");
        return Err(e.into());
    }

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let server = HttpServer::new(server_config);
    server.run(shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(ExitCode::SUCCESS)
}
