//! Clock and timer primitive.
//!
//! Deadlines are wall-clock `DateTime<Utc>` values so they can be compared with
//! inbound message timestamps, but the default clock derives them from tokio's
//! monotonic `Instant`. Sleeping therefore honours tokio's paused test clock.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock anchor advanced by tokio's monotonic clock.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    anchor: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::anchored_at(Utc::now())
    }

    /// Start counting from a fixed wall-clock time.
    pub fn anchored_at(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor,
            started: tokio::time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.started.elapsed())
            .ok()
            .and_then(|elapsed| self.anchor.checked_add_signed(elapsed))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Time remaining until `deadline`, saturating at zero.
pub fn until(clock: &dyn Clock, deadline: DateTime<Utc>) -> Duration {
    (deadline - clock.now()).to_std().unwrap_or(Duration::ZERO)
}

/// Sleep until the clock reaches `deadline`.
///
/// Not cancellable on its own; race it against a `CancellationToken` in
/// `tokio::select!`.
pub async fn sleep_until(clock: &dyn Clock, deadline: DateTime<Utc>) {
    let remaining = until(clock, deadline);
    if !remaining.is_zero() {
        tokio::time::sleep(remaining).await;
    }
}
