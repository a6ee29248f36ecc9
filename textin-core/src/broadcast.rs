//! Group-wide alert fan-out.

use std::sync::{Arc, Weak};

use futures::future::join_all;
use tracing::{info, warn};

use crate::registry::Registry;
use crate::transport::Outbound;

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Sends a message to every registered contact.
///
/// Holds only a weak handle to the registry: contacts hold the hub, and the
/// registry holds the contacts.
pub struct BroadcastHub {
    registry: Weak<Registry>,
    outbound: Arc<dyn Outbound>,
}

impl BroadcastHub {
    pub(crate) fn new(registry: Weak<Registry>, outbound: Arc<dyn Outbound>) -> Self {
        Self { registry, outbound }
    }

    /// Deliver `message` to a snapshot of the registry taken at call time.
    ///
    /// The registry lock is released before any delivery starts, so
    /// registrations and removals proceed while the fan-out is in flight.
    pub async fn broadcast(&self, message: &str) -> BroadcastReport {
        let recipients = self
            .registry
            .upgrade()
            .map(|registry| registry.contact_ids())
            .unwrap_or_default();

        let results = join_all(
            recipients
                .iter()
                .map(|to| async move { (to, self.outbound.send(to, message).await) }),
        )
        .await;

        let mut report = BroadcastReport::default();
        for (to, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.failed += 1;
                    warn!(contact = %to, %err, "broadcast delivery failed");
                }
            }
        }

        let logged = message.replace('\n', "\n\t");
        info!(
            recipients = recipients.len(),
            delivered = report.delivered,
            failed = report.failed,
            "Broadcast to all:\n\t{logged}"
        );
        report
    }
}
