//! Per-contact mutable state and its transitions.
//!
//! Everything here is synchronous. `Contact` holds a `ContactState` behind a
//! mutex and performs the IO a transition calls for after releasing it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::InputError;

/// Wait after the reminder before the first alert goes out.
pub const GRACE_PERIOD: Duration = Duration::from_secs(60);

/// Repeat interval for alerts after the first one, until the contact checks in.
pub const ESCALATION_CADENCE: Duration = Duration::from_secs(2 * 60);

/// Registration progress of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    AwaitingName,
    AwaitingInterval,
    Monitoring,
}

/// What the escalation task should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationStep {
    /// Check-ins are paused; wait on the gate.
    Paused,
    /// Nothing due yet.
    SleepUntil(DateTime<Utc>),
    /// Deadline passed: remind the contact, then wait out the grace period.
    Remind { until: DateTime<Utc> },
    /// Still silent after the reminder: alert everyone, then wait a cadence.
    Escalate {
        alert: String,
        until: DateTime<Utc>,
    },
}

/// Mutable fields of a contact.
#[derive(Debug, Clone)]
pub struct ContactState {
    display_name: Option<String>,
    interval_minutes: Option<u32>,
    last_check_in: Option<DateTime<Utc>>,
    last_message: Option<String>,
    next_deadline: Option<DateTime<Utc>>,
    /// When the pending reminder escalates, or the next repeat alert is due.
    next_alert: Option<DateTime<Utc>>,
    paused: bool,
    awaiting_response: bool,
}

impl ContactState {
    pub fn new() -> Self {
        Self {
            display_name: None,
            interval_minutes: None,
            last_check_in: None,
            last_message: None,
            next_deadline: None,
            next_alert: None,
            paused: false,
            awaiting_response: false,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match (&self.display_name, self.interval_minutes) {
            (None, _) => Lifecycle::AwaitingName,
            (Some(_), None) => Lifecycle::AwaitingInterval,
            (Some(_), Some(_)) => Lifecycle::Monitoring,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn interval_minutes(&self) -> Option<u32> {
        self.interval_minutes
    }

    pub fn last_check_in(&self) -> Option<DateTime<Utc>> {
        self.last_check_in
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.next_deadline
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    /// Record the display name. Rejects blank names.
    pub fn set_name(&mut self, text: &str) -> Result<&str, InputError> {
        let name = text.trim();
        if name.is_empty() {
            return Err(InputError::InvalidName);
        }
        Ok(self.display_name.insert(name.to_string()).as_str())
    }

    /// Parse and apply a check-in interval in minutes. Starts a fresh cycle
    /// measured from `at`.
    pub fn set_interval(&mut self, text: &str, at: DateTime<Utc>) -> Result<u32, InputError> {
        let minutes = parse_interval(text)?;
        self.interval_minutes = Some(minutes);
        self.last_check_in = Some(at);
        self.next_deadline = Some(deadline_after(at, minutes));
        self.awaiting_response = false;
        self.next_alert = None;
        Ok(minutes)
    }

    /// Record a plain check-in. Returns true if it also resumed a paused
    /// contact. Must only be called once an interval is set.
    pub fn check_in(&mut self, text: &str, at: DateTime<Utc>) -> bool {
        let minutes = self.interval_minutes.unwrap_or(1);
        self.last_check_in = Some(at);
        self.last_message = Some(text.to_string());
        self.next_deadline = Some(deadline_after(at, minutes));
        self.awaiting_response = false;
        self.next_alert = None;
        std::mem::replace(&mut self.paused, false)
    }

    /// Pause check-ins. Returns false if already paused.
    pub fn pause(&mut self) -> bool {
        if self.paused {
            return false;
        }
        self.paused = true;
        self.awaiting_response = false;
        self.next_alert = None;
        true
    }

    /// Resume check-ins, starting a fresh cycle measured from `at`. Returns
    /// false, leaving the schedule alone, if not paused.
    pub fn resume(&mut self, at: DateTime<Utc>) -> bool {
        if !std::mem::replace(&mut self.paused, false) {
            return false;
        }
        let minutes = self.interval_minutes.unwrap_or(1);
        self.last_check_in = Some(at);
        self.next_deadline = Some(deadline_after(at, minutes));
        self.awaiting_response = false;
        self.next_alert = None;
        true
    }

    /// Minutes elapsed since the last check-in.
    pub fn minutes_since_check_in(&self, now: DateTime<Utc>) -> i64 {
        self.last_check_in
            .map(|last| (now - last).num_minutes())
            .unwrap_or_default()
    }

    /// Decide the escalation task's next move, updating the reminder
    /// bookkeeping in the same step.
    pub fn escalation_step(&mut self, id: &str, now: DateTime<Utc>) -> EscalationStep {
        if self.paused {
            return EscalationStep::Paused;
        }
        let Some(deadline) = self.next_deadline else {
            return EscalationStep::Paused;
        };
        if now < deadline {
            return EscalationStep::SleepUntil(deadline);
        }

        if !self.awaiting_response {
            let until = now + chrono_duration(GRACE_PERIOD);
            self.awaiting_response = true;
            self.next_alert = Some(until);
            return EscalationStep::Remind { until };
        }

        match self.next_alert {
            Some(due) if now < due => EscalationStep::SleepUntil(due),
            _ => {
                let until = now + chrono_duration(ESCALATION_CADENCE);
                self.next_alert = Some(until);
                EscalationStep::Escalate {
                    alert: self.missed_check_in_alert(id, now),
                    until,
                }
            }
        }
    }

    fn missed_check_in_alert(&self, id: &str, now: DateTime<Utc>) -> String {
        format!(
            "ALERT: {} failed to check-in\n{}\nLast check-in {} minutes ago:\n\"{}\"",
            self.display_name.as_deref().unwrap_or(id),
            id,
            self.minutes_since_check_in(now),
            self.last_message.as_deref().unwrap_or_default(),
        )
    }
}

impl Default for ContactState {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_interval(text: &str) -> Result<u32, InputError> {
    let invalid = || InputError::InvalidInterval {
        input: text.to_string(),
    };
    let value: i64 = text.trim().parse().map_err(|_| invalid())?;
    if value <= 0 {
        return Err(invalid());
    }
    u32::try_from(value).map_err(|_| invalid())
}

fn deadline_after(at: DateTime<Utc>, minutes: u32) -> DateTime<Utc> {
    at + chrono::Duration::seconds(60 * i64::from(minutes))
}

fn chrono_duration(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn monitoring(minutes: &str) -> ContactState {
        let mut state = ContactState::new();
        state.set_name("Alice").unwrap();
        state.set_interval(minutes, t0()).unwrap();
        state
    }

    #[test]
    fn test_lifecycle_progression() {
        let mut state = ContactState::new();
        assert_eq!(state.lifecycle(), Lifecycle::AwaitingName);

        assert_eq!(state.set_name(""), Err(InputError::InvalidName));
        assert_eq!(state.lifecycle(), Lifecycle::AwaitingName);

        assert_eq!(state.set_name("Alice").unwrap(), "Alice");
        assert_eq!(state.lifecycle(), Lifecycle::AwaitingInterval);

        assert_eq!(state.set_interval("10", t0()), Ok(10));
        assert_eq!(state.lifecycle(), Lifecycle::Monitoring);
        assert_eq!(
            state.next_deadline(),
            Some(t0() + chrono::Duration::seconds(600))
        );
    }

    #[test]
    fn test_invalid_interval_leaves_state_unchanged() {
        let mut state = ContactState::new();
        state.set_name("Alice").unwrap();

        for input in ["", "ten", "0", "-5", "1.5", "99999999999"] {
            assert_eq!(
                state.set_interval(input, t0()),
                Err(InputError::InvalidInterval {
                    input: input.to_string()
                })
            );
            assert_eq!(state.lifecycle(), Lifecycle::AwaitingInterval);
            assert_eq!(state.next_deadline(), None);
        }
    }

    #[test]
    fn test_check_in_resets_deadline_and_clears_waiting() {
        let mut state = monitoring("10");
        let late = t0() + chrono::Duration::seconds(600);
        assert!(matches!(
            state.escalation_step("+1555", late),
            EscalationStep::Remind { .. }
        ));
        assert!(state.awaiting_response());

        let at = late + chrono::Duration::seconds(30);
        assert!(!state.check_in("fine", at));
        assert!(!state.awaiting_response());
        assert_eq!(state.last_message(), Some("fine"));
        assert_eq!(
            state.next_deadline(),
            Some(at + chrono::Duration::seconds(600))
        );
    }

    #[test]
    fn test_check_in_while_paused_resumes() {
        let mut state = monitoring("5");
        assert!(state.pause());
        assert!(!state.pause());
        assert!(state.is_paused());

        assert!(state.check_in("back", t0()));
        assert!(!state.is_paused());
    }

    #[test]
    fn test_resume_restarts_cycle_from_resume_time() {
        let mut state = monitoring("10");
        assert!(!state.resume(t0()));
        assert_eq!(
            state.next_deadline(),
            Some(t0() + chrono::Duration::seconds(600))
        );

        state.pause();
        let back = t0() + chrono::Duration::hours(1);
        assert!(state.resume(back));
        assert!(!state.is_paused());
        assert_eq!(state.last_check_in(), Some(back));
        assert_eq!(
            state.next_deadline(),
            Some(back + chrono::Duration::seconds(600))
        );
        assert_eq!(
            state.escalation_step("+1555", back),
            EscalationStep::SleepUntil(back + chrono::Duration::seconds(600))
        );
    }

    #[test]
    fn test_paused_contact_never_escalates() {
        let mut state = monitoring("1");
        state.pause();
        let much_later = t0() + chrono::Duration::hours(3);
        assert_eq!(
            state.escalation_step("+1555", much_later),
            EscalationStep::Paused
        );
        assert!(!state.awaiting_response());
    }

    #[test]
    fn test_escalation_cycle() {
        let mut state = monitoring("10");
        let id = "+15550001111";

        let early = t0() + chrono::Duration::seconds(10);
        assert_eq!(
            state.escalation_step(id, early),
            EscalationStep::SleepUntil(t0() + chrono::Duration::seconds(600))
        );

        let deadline = t0() + chrono::Duration::seconds(600);
        let grace_end = deadline + chrono::Duration::seconds(60);
        assert_eq!(
            state.escalation_step(id, deadline),
            EscalationStep::Remind { until: grace_end }
        );

        // An early wake inside the grace period must not alert.
        let inside_grace = deadline + chrono::Duration::seconds(20);
        assert_eq!(
            state.escalation_step(id, inside_grace),
            EscalationStep::SleepUntil(grace_end)
        );

        match state.escalation_step(id, grace_end) {
            EscalationStep::Escalate { alert, until } => {
                assert!(alert.contains("Alice failed to check-in"));
                assert!(alert.contains(id));
                assert!(alert.contains("Last check-in 11 minutes ago"));
                assert_eq!(until, grace_end + chrono::Duration::seconds(120));
            }
            other => panic!("expected escalation, got {other:?}"),
        }

        let next_round = grace_end + chrono::Duration::seconds(120);
        assert!(matches!(
            state.escalation_step(id, next_round),
            EscalationStep::Escalate { .. }
        ));
    }

    #[test]
    fn test_reset_starts_fresh_cycle() {
        let mut state = monitoring("10");
        let deadline = t0() + chrono::Duration::seconds(600);
        state.escalation_step("+1555", deadline);
        assert!(state.awaiting_response());

        state.set_interval("30", deadline).unwrap();
        assert!(!state.awaiting_response());
        assert_eq!(
            state.next_deadline(),
            Some(deadline + chrono::Duration::seconds(1800))
        );
    }

    proptest! {
        #[test]
        fn prop_positive_interval_sets_deadline(k in 1u32..=100_000) {
            let mut state = ContactState::new();
            state.set_name("Bob").unwrap();
            prop_assert_eq!(state.set_interval(&k.to_string(), t0()), Ok(k));
            prop_assert_eq!(
                state.next_deadline(),
                Some(state.last_check_in().unwrap() + chrono::Duration::seconds(60 * i64::from(k)))
            );
        }

        #[test]
        fn prop_non_positive_interval_is_rejected(k in i64::MIN..=0) {
            let mut state = ContactState::new();
            state.set_name("Bob").unwrap();
            let is_invalid = matches!(
                state.set_interval(&k.to_string(), t0()),
                Err(InputError::InvalidInterval { .. })
            );
            prop_assert!(is_invalid);
            prop_assert_eq!(state.lifecycle(), Lifecycle::AwaitingInterval);
        }

        #[test]
        fn prop_named_contact_never_renamed(name in "[A-Za-z][A-Za-z ]{0,20}", next in "\\PC{0,20}") {
            let mut state = ContactState::new();
            state.set_name(&name).unwrap();
            prop_assert_eq!(state.lifecycle(), Lifecycle::AwaitingInterval);
            let _ = state.set_interval(&next, t0());
            prop_assert_eq!(state.display_name(), Some(name.trim()));
        }
    }
}
