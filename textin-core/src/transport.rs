//! Outbound transport port.
//!
//! The engine only ever talks to contacts through [`Outbound`]. Delivery is
//! best-effort: failures are logged by the caller and never retried.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use textin_types::ContactId;

/// Outbound delivery failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The provider answered but refused the message
    #[error("provider rejected message (status {status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The provider could not be reached
    #[error("transport error: {0}")]
    Transport(String),
}

/// Sends a text to one contact.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send(&self, to: &ContactId, text: &str) -> Result<(), DeliveryError>;
}

/// A message handed to a [`RecordingOutbound`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: ContactId,
    pub text: String,
}

/// In-memory outbound that records every message it accepts.
#[derive(Debug, Default)]
pub struct RecordingOutbound {
    sent: Mutex<Vec<SentMessage>>,
    failing: Mutex<HashSet<ContactId>>,
}

impl RecordingOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `id` fail with a transport error.
    pub fn fail_for(&self, id: impl Into<ContactId>) {
        self.failing.lock().insert(id.into());
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Texts delivered to `id`, oldest first.
    pub fn sent_to(&self, id: &str) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.to.as_str() == id)
            .map(|m| m.text.clone())
            .collect()
    }

    /// Number of delivered texts containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.text.contains(needle))
            .count()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

#[async_trait]
impl Outbound for RecordingOutbound {
    async fn send(&self, to: &ContactId, text: &str) -> Result<(), DeliveryError> {
        if self.failing.lock().contains(to) {
            return Err(DeliveryError::Transport(format!("unreachable: {to}")));
        }
        self.sent.lock().push(SentMessage {
            to: to.clone(),
            text: text.to_string(),
        });
        Ok(())
    }
}
