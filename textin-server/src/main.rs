//! textin-server: SMS check-in daemon.
//!
//! Receives the SMS provider's webhook, runs each message through the check-in
//! engine, and answers with TwiML. Reminders and group alerts go out through
//! the provider's REST API, or to the log in dry-run mode.

use anyhow::Result;
use clap::Parser;

use textin_server::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    textin_server::run_with_cli(cli).await
}
