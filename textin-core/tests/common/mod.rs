//! Shared helpers for the integration suites.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use textin_core::{InboundMessage, Lifecycle, MonotonicClock, RecordingOutbound, Registry};

pub fn setup() -> (Arc<Registry>, Arc<RecordingOutbound>) {
    let outbound = Arc::new(RecordingOutbound::new());
    let registry = Registry::new(outbound.clone(), Arc::new(MonotonicClock::new()));
    (registry, outbound)
}

/// Deliver `body` from `from`, stamped with the registry clock.
pub async fn text(registry: &Registry, from: &str, body: &str) -> Option<String> {
    let message = InboundMessage::new(from, body, registry.clock().now());
    registry.dispatch(&message).await
}

/// Register `from` with `name` and an interval of `minutes`.
pub async fn enroll(registry: &Registry, from: &str, name: &str, minutes: u32) {
    text(registry, from, name).await;
    text(registry, from, &minutes.to_string()).await;
    let contact = registry.get(&from.into()).expect("contact registered");
    assert_eq!(contact.lifecycle(), Lifecycle::Monitoring);
}

/// Let virtual time pass. Requires a paused-clock runtime.
pub async fn pass(seconds: u64) {
    tokio::time::sleep(Duration::from_secs(seconds)).await;
}
