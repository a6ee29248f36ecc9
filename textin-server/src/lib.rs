//! Library entrypoint for textin-server so tests and other binaries can build
//! the router without going through the CLI.

pub mod cli;
pub mod config;
pub mod server;
pub mod sms;
pub mod twiml;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use textin_core::{MonotonicClock, Registry};

use crate::config::ServerConfig;

fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    Ok(())
}

/// Run the daemon using CLI args (parsed by the caller).
pub async fn run_with_cli(cli: cli::Cli) -> Result<()> {
    init_tracing(cli.verbose, cli.log.as_deref())?;

    let cfg = ServerConfig::from_cli(&cli)?;
    let outbound = sms::build_outbound(&cfg.outbound)?;
    let registry = Registry::new(outbound, Arc::new(MonotonicClock::new()));

    info!("Starting text-in session");
    server::serve(cfg, registry).await
}
