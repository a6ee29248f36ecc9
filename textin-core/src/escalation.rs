//! Per-contact escalation task.
//!
//! Each cycle waits for the pause gate to open, asks the contact state what is
//! due, performs the reminder or alert, then sleeps until the next due time.
//! Every suspension, outbound delivery included, also listens for
//! cancellation, and the sleep additionally ends early on a wake from the
//! inbound handler.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::clock;
use crate::contact::Contact;
use crate::state::EscalationStep;

const REMINDER: &str = "Please check-in. The timer is up.";
const ALERT_SENT: &str = "Alert sent. Text \"@ok MSG\" to send an ok message to the group.";

pub(crate) async fn run(contact: Arc<Contact>) {
    debug!(contact = %contact.id, "escalation task started");

    loop {
        tokio::select! {
            biased;
            _ = contact.cancel.cancelled() => break,
            _ = contact.gate.wait_open() => {}
        }

        let now = contact.clock.now();
        let step = contact
            .state
            .lock()
            .escalation_step(contact.id.as_str(), now);

        let wake_at = match step {
            EscalationStep::Paused => {
                // The gate is about to close; wait for the signal that follows.
                tokio::select! {
                    biased;
                    _ = contact.cancel.cancelled() => break,
                    _ = contact.wake.notified() => {}
                }
                continue;
            }
            EscalationStep::SleepUntil(due) => due,
            EscalationStep::Remind { until } => {
                info!(contact = %contact.id, "notifying contact to check in");
                tokio::select! {
                    biased;
                    _ = contact.cancel.cancelled() => break,
                    _ = contact.send(REMINDER) => {}
                }
                until
            }
            EscalationStep::Escalate { alert, until } => {
                warn!(contact = %contact.id, name = %contact.label(), "failed to check-in");
                let deliver = async {
                    contact.hub.broadcast(&alert).await;
                    contact.send(ALERT_SENT).await;
                };
                tokio::select! {
                    biased;
                    _ = contact.cancel.cancelled() => break,
                    _ = deliver => {}
                }
                until
            }
        };

        tokio::select! {
            biased;
            _ = contact.cancel.cancelled() => break,
            _ = contact.wake.notified() => {}
            _ = clock::sleep_until(contact.clock.as_ref(), wake_at) => {}
        }
    }

    debug!(contact = %contact.id, "escalation task stopped");
}
