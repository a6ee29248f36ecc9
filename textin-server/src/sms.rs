//! Outbound SMS transports.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use textin_core::{ContactId, DeliveryError, Outbound};

use crate::config::{OutboundConfig, TwilioConfig};

/// Upper bound on one provider request, connect included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Pick the outbound transport for this process.
pub fn build_outbound(config: &OutboundConfig) -> Result<Arc<dyn Outbound>> {
    Ok(match config {
        OutboundConfig::Twilio(twilio) => Arc::new(TwilioOutbound::new(twilio.clone())?),
        OutboundConfig::DryRun => Arc::new(LogOutbound),
    })
}

/// Sends messages through the Twilio Messages REST API.
pub struct TwilioOutbound {
    client: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioOutbound {
    pub fn new(config: TwilioConfig) -> Result<Self> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    /// Like [`TwilioOutbound::new`] with a custom per-request timeout.
    pub fn with_timeout(config: TwilioConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build Twilio HTTP client")?;
        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

#[async_trait]
impl Outbound for TwilioOutbound {
    async fn send(&self, to: &ContactId, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("From", self.config.from_number.as_str()),
                ("To", to.as_str()),
                ("Body", text),
            ])
            .send()
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(contact = %to, %status, "message accepted by provider");
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}

/// Dry-run transport: logs what would have been sent.
pub struct LogOutbound;

#[async_trait]
impl Outbound for LogOutbound {
    async fn send(&self, to: &ContactId, text: &str) -> Result<(), DeliveryError> {
        info!(contact = %to, text, "dry run: message not sent");
        Ok(())
    }
}
