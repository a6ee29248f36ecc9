//! A registered contact: its state machine, directive handling, and the
//! handle to its escalation task.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use textin_types::ContactId;

use crate::broadcast::BroadcastHub;
use crate::clock::Clock;
use crate::command::Directive;
use crate::error::{CoreError, InputError, Result};
use crate::escalation;
use crate::gate::PauseGate;
use crate::state::{ContactState, Lifecycle};
use crate::transport::Outbound;

const STOPPED_REPLY: &str = "Stopped check-ins. Text again to resume.";

/// Result of handling one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Reply to the sender
    Reply(String),
    /// Input was rejected; the contact is unchanged
    Rejected(InputError),
    /// Handled, nothing to say back
    Silent,
    /// The contact asked to leave. The caller removes it.
    Quit,
}

impl Outcome {
    /// Text to send back to the sender, if any. `Quit` has none; the
    /// dispatcher supplies the farewell.
    pub fn reply_text(&self) -> Option<String> {
        match self {
            Outcome::Reply(text) => Some(text.clone()),
            Outcome::Rejected(err) => Some(err.to_string()),
            Outcome::Silent | Outcome::Quit => None,
        }
    }
}

/// Read-only view of a contact, for status endpoints and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactSummary {
    pub id: ContactId,
    pub display_name: Option<String>,
    pub lifecycle: Lifecycle,
    pub interval_minutes: Option<u32>,
    pub last_check_in: Option<DateTime<Utc>>,
    pub last_message: Option<String>,
    pub next_deadline: Option<DateTime<Utc>>,
    pub paused: bool,
    pub awaiting_response: bool,
}

/// One registered identity.
///
/// Two locks guard it. `inbox` is held for the whole of one inbound message,
/// which keeps a contact's messages in arrival order. `state` is held only
/// for synchronous reads and writes and is shared with the escalation task.
pub struct Contact {
    pub(crate) id: ContactId,
    pub(crate) state: Mutex<ContactState>,
    inbox: tokio::sync::Mutex<()>,
    pub(crate) gate: PauseGate,
    pub(crate) wake: Notify,
    pub(crate) cancel: CancellationToken,
    escalation: Mutex<Option<JoinHandle<()>>>,
    pub(crate) outbound: Arc<dyn Outbound>,
    pub(crate) hub: Arc<BroadcastHub>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl Contact {
    pub(crate) fn new(
        id: ContactId,
        outbound: Arc<dyn Outbound>,
        hub: Arc<BroadcastHub>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            state: Mutex::new(ContactState::new()),
            inbox: tokio::sync::Mutex::new(()),
            gate: PauseGate::new(),
            wake: Notify::new(),
            cancel: CancellationToken::new(),
            escalation: Mutex::new(None),
            outbound,
            hub,
            clock,
        })
    }

    pub fn id(&self) -> &ContactId {
        &self.id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lock().lifecycle()
    }

    pub fn summary(&self) -> ContactSummary {
        let state = self.state.lock();
        ContactSummary {
            id: self.id.clone(),
            display_name: state.display_name().map(str::to_string),
            lifecycle: state.lifecycle(),
            interval_minutes: state.interval_minutes(),
            last_check_in: state.last_check_in(),
            last_message: state.last_message().map(str::to_string),
            next_deadline: state.next_deadline(),
            paused: state.is_paused(),
            awaiting_response: state.awaiting_response(),
        }
    }

    /// True while the escalation task is alive.
    pub fn is_escalating(&self) -> bool {
        self.escalation
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// True once the contact has quit or been removed.
    pub fn is_retired(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the escalation task wherever it is suspended. Idempotent.
    pub(crate) fn retire(&self) {
        self.cancel.cancel();
    }

    /// Name used in alerts: the display name, or the raw id before one is set.
    pub(crate) fn label(&self) -> String {
        self.state
            .lock()
            .display_name()
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Best-effort send to this contact.
    pub(crate) async fn send(&self, text: &str) {
        if let Err(err) = self.outbound.send(&self.id, text).await {
            warn!(contact = %self.id, %err, "message delivery failed");
        }
    }

    /// Feed one inbound message through the state machine.
    ///
    /// Returns `CoreError::Retired` if the contact quit while this message
    /// was waiting its turn.
    pub async fn handle_input(self: &Arc<Self>, text: &str, at: DateTime<Utc>) -> Result<Outcome> {
        let _turn = self.inbox.lock().await;
        if self.is_retired() {
            return Err(CoreError::Retired(self.id.clone()));
        }

        let lifecycle = self.lifecycle();
        let outcome = match lifecycle {
            Lifecycle::AwaitingName => self.take_name(text),
            Lifecycle::AwaitingInterval => self.take_interval(text, at),
            Lifecycle::Monitoring => match Directive::parse(text) {
                Some(directive) => self.run_directive(directive, at).await,
                None => self.take_check_in(text, at),
            },
        };
        Ok(outcome)
    }

    fn take_name(&self, text: &str) -> Outcome {
        let mut state = self.state.lock();
        match state.set_name(text) {
            Ok(name) => {
                info!(contact = %self.id, name, "new user");
                Outcome::Reply(format!(
                    "Welcome {name}!\nHow often would you like to check-in? Please enter an integer in minutes."
                ))
            }
            Err(err) => Outcome::Rejected(err),
        }
    }

    fn take_interval(self: &Arc<Self>, text: &str, at: DateTime<Utc>) -> Outcome {
        let result = self.state.lock().set_interval(text, at);
        match result {
            Ok(minutes) => {
                info!(contact = %self.id, interval_minutes = minutes, "check-in interval updated");
                self.ensure_escalation();
                Outcome::Reply(format!("Next check-in in {minutes} mins."))
            }
            Err(err) => Outcome::Rejected(err),
        }
    }

    fn take_check_in(&self, text: &str, at: DateTime<Utc>) -> Outcome {
        let (resumed, minutes) = {
            let mut state = self.state.lock();
            let resumed = state.check_in(text, at);
            (resumed, state.interval_minutes().unwrap_or_default())
        };
        if resumed {
            self.gate.resume();
            info!(contact = %self.id, "check-ins resumed");
        }
        self.wake.notify_one();
        info!(contact = %self.id, message = text, "check-in");

        Outcome::Reply(format!(
            "Check-in received.  Next check-in in {minutes} minutes."
        ))
    }

    async fn run_directive(self: &Arc<Self>, directive: Directive, at: DateTime<Utc>) -> Outcome {
        info!(contact = %self.id, command = directive.name(), "directive");
        match directive {
            Directive::Quit => {
                info!(contact = %self.id, "quit the session");
                self.retire();
                Outcome::Quit
            }
            Directive::Stop => self.pause(),
            Directive::Sos(message) => {
                self.resume_if_paused(at);
                self.raise_sos(&message).await;
                Outcome::Silent
            }
            Directive::Reset(argument) => {
                self.resume_if_paused(at);
                self.take_interval(&argument, at)
            }
            Directive::Ok(message) => {
                self.resume_if_paused(at);
                self.report_ok(&message).await;
                self.take_check_in(&message, at)
            }
            Directive::Unknown(command) => {
                self.resume_if_paused(at);
                Outcome::Rejected(InputError::UnknownCommand { command })
            }
        }
    }

    async fn raise_sos(&self, message: &str) {
        let name = self.label();
        warn!(contact = %self.id, name = %name, message, "@sos");
        let alert = format!("ALERT: {name} sent an @sos\n{}\n\"{message}\"", self.id);
        self.hub.broadcast(&alert).await;
    }

    async fn report_ok(&self, message: &str) {
        let name = self.label();
        info!(contact = %self.id, name = %name, message, "is ok");
        let update = format!("UPDATE: {name} is @ok\n\"{message}\"");
        self.hub.broadcast(&update).await;
    }

    fn pause(&self) -> Outcome {
        if self.state.lock().pause() {
            self.gate.pause();
            self.wake.notify_one();
            info!(contact = %self.id, "stopped check-ins");
        }
        Outcome::Reply(STOPPED_REPLY.to_string())
    }

    fn resume_if_paused(&self, at: DateTime<Utc>) {
        if self.state.lock().resume(at) {
            self.gate.resume();
            self.wake.notify_one();
            info!(contact = %self.id, "check-ins resumed");
        }
    }

    /// Start the escalation task on the first interval; afterwards just wake
    /// it so it picks up the new deadline.
    fn ensure_escalation(self: &Arc<Self>) {
        let mut slot = self.escalation.lock();
        if slot.is_none() && !self.is_retired() {
            *slot = Some(tokio::spawn(escalation::run(Arc::clone(self))));
        } else {
            self.wake.notify_one();
        }
    }
}
