//! textin-core: the check-in engine.
//!
//! Contacts register by texting in, pick a check-in interval, and are then
//! expected to text at least that often. Each monitored contact owns an
//! escalation task that reminds them when the deadline passes and, if they
//! stay silent, broadcasts an alert to every registered contact until they
//! check in again.
//!
//! ```text
//! inbound message ──► Registry::dispatch ──► Contact::handle_input
//!                                              │  state machine / directives
//!                                              ├──► reply
//!                                              ├──► BroadcastHub::broadcast
//!                                              └──► wake / pause / resume ──┐
//!                                                                           ▼
//!                                   escalation task (one per contact) ◄─────┘
//!                                     reminder ─► grace period ─► alert ─► repeat
//! ```
//!
//! Transports are pluggable through [`Outbound`]; the HTTP shell lives in
//! `textin-server`.

pub mod broadcast;
pub mod clock;
pub mod command;
pub mod contact;
pub mod error;
mod escalation;
pub mod gate;
pub mod registry;
pub mod state;
pub mod transport;

pub use broadcast::{BroadcastHub, BroadcastReport};
pub use clock::{Clock, MonotonicClock};
pub use command::Directive;
pub use contact::{Contact, ContactSummary, Outcome};
pub use error::{CoreError, InputError};
pub use registry::{Registry, FAREWELL};
pub use state::{ContactState, EscalationStep, Lifecycle, ESCALATION_CADENCE, GRACE_PERIOD};
pub use transport::{DeliveryError, Outbound, RecordingOutbound, SentMessage};

pub use textin_types::{ContactId, InboundMessage};
