use std::fmt;
use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing::warn;

use crate::cli::Cli;

/// Credentials for the Twilio Messages API.
#[derive(Clone, PartialEq, Eq)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub api_base: String,
}

impl fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("from_number", &self.from_number)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Where outbound messages go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundConfig {
    Twilio(TwilioConfig),
    /// Log instead of sending
    DryRun,
}

/// Runtime configuration derived from CLI/env.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub log_file: Option<PathBuf>,
    pub outbound: OutboundConfig,
}

impl ServerConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let outbound = if cli.dry_run {
            OutboundConfig::DryRun
        } else {
            twilio_from_cli(cli)?
        };

        Ok(Self {
            listen_addr: cli.listen_addr.clone(),
            log_file: cli.log.clone(),
            outbound,
        })
    }
}

fn twilio_from_cli(cli: &Cli) -> Result<OutboundConfig> {
    match (
        &cli.twilio_account_sid,
        &cli.twilio_auth_token,
        &cli.twilio_from,
    ) {
        (Some(sid), Some(token), Some(from)) => Ok(OutboundConfig::Twilio(TwilioConfig {
            account_sid: sid.clone(),
            auth_token: token.clone(),
            from_number: from.clone(),
            api_base: cli.twilio_api_base.clone(),
        })),
        (None, None, None) => {
            warn!("no Twilio credentials configured; outbound messages will only be logged");
            Ok(OutboundConfig::DryRun)
        }
        (sid, token, from) => {
            let missing: Vec<&str> = [
                ("--twilio-account-sid", sid.is_none()),
                ("--twilio-auth-token", token.is_none()),
                ("--twilio-from", from.is_none()),
            ]
            .into_iter()
            .filter_map(|(flag, absent)| absent.then_some(flag))
            .collect();
            bail!("incomplete Twilio credentials, missing {}", missing.join(", "))
        }
    }
}
