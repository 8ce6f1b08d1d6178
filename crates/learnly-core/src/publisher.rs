//! Post-commit event publication port.

use async_trait::async_trait;

use crate::event_store::StoredEvent;

/// Fans committed events out to downstream consumers.
///
/// Publication happens only after the store append succeeded; consumer
/// failures are an implementation concern and must never surface to the
/// write path, so `publish` is infallible from the caller's perspective.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish committed events, in order, to all interested consumers.
    async fn publish(&self, events: &[StoredEvent]);
}
