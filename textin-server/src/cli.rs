use std::path::PathBuf;

use clap::Parser;

/// CLI for the check-in webhook daemon.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "textin-server",
    about = "SMS check-in daemon: reminds contacts and alerts the group when someone goes quiet"
)]
pub struct Cli {
    /// Listen address for the webhook endpoint
    #[arg(long, env = "TEXTIN_ADDR", default_value = "127.0.0.1:5000")]
    pub listen_addr: String,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "TEXTIN_LOG_FILE")]
    pub log: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // SMS provider options
    // ─────────────────────────────────────────────────────────────────────────

    /// Twilio account SID used for outbound messages.
    #[arg(long, env = "TWILIO_ACCOUNT_SID")]
    pub twilio_account_sid: Option<String>,

    /// Twilio auth token.
    #[arg(long, env = "TWILIO_AUTH_TOKEN", hide_env_values = true)]
    pub twilio_auth_token: Option<String>,

    /// Number messages are sent from.
    #[arg(long, env = "TWILIO_NUMBER")]
    pub twilio_from: Option<String>,

    /// Base URL of the Twilio REST API.
    #[arg(long, env = "TWILIO_API_BASE", default_value = "https://api.twilio.com")]
    pub twilio_api_base: String,

    /// Log outbound messages instead of sending them.
    #[arg(long)]
    pub dry_run: bool,
}
