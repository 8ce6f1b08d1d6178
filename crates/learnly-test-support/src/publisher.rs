//! Test publishers — mock `EventPublisher` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use learnly_core::event_store::StoredEvent;
use learnly_core::publisher::EventPublisher;

/// A publisher that records every published event.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<StoredEvent>>,
}

impl RecordingPublisher {
    /// Creates an empty recording publisher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all published events, in publish order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn published_events(&self) -> Vec<StoredEvent> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, events: &[StoredEvent]) {
        self.published.lock().unwrap().extend_from_slice(events);
    }
}

/// A publisher that drops every event.
#[derive(Debug, Default)]
pub struct NullPublisher;

#[async_trait]
impl EventPublisher for NullPublisher {
    async fn publish(&self, _events: &[StoredEvent]) {}
}
