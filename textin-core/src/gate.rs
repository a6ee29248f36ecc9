//! Cross-task pause gate.
//!
//! The inbound handler closes and reopens the gate; the escalation task waits
//! on it. Opening is a signal, not a lock release, so any task may open a gate
//! that another task is blocked on.

use tokio::sync::watch;

/// Open/closed gate backed by a watch channel. `true` means paused.
#[derive(Debug)]
pub struct PauseGate {
    tx: watch::Sender<bool>,
}

impl PauseGate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn is_paused(&self) -> bool {
        *self.tx.borrow()
    }

    /// Close the gate. Returns false if it was already closed.
    pub fn pause(&self) -> bool {
        self.tx.send_if_modified(|paused| !std::mem::replace(paused, true))
    }

    /// Open the gate, releasing any waiter. Returns false if it was already open.
    pub fn resume(&self) -> bool {
        self.tx.send_if_modified(|paused| std::mem::replace(paused, false))
    }

    /// Wait until the gate is open. Returns immediately when it already is.
    pub async fn wait_open(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|paused| !*paused).await;
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}
