//! Event store abstraction.
//!
//! The event stream for one aggregate is the only mutable shared resource
//! in the core. Every write goes through [`EventStore::append_events`]
//! with an optimistic version check; no other write path exists.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::DomainEvent;

/// Stored representation of a domain event.
#[derive(Debug, Clone)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Version within the aggregate stream, 1-based and gapless.
    pub event_version: i64,
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Causation ID linking to the causing event/command.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

impl StoredEvent {
    /// Builds the persisted form of a domain event from its metadata and
    /// payload.
    #[must_use]
    pub fn from_domain<E: DomainEvent>(event: &E) -> Self {
        let meta = event.metadata();
        Self {
            event_id: meta.event_id,
            aggregate_id: meta.aggregate_id,
            event_type: event.event_type().to_owned(),
            payload: event.to_payload(),
            event_version: meta.event_version,
            correlation_id: meta.correlation_id,
            causation_id: meta.causation_id,
            occurred_at: meta.occurred_at,
        }
    }
}

/// Append-only, per-stream event log with optimistic concurrency.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Load all events for a given aggregate, ordered by event version.
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError>;

    /// Load events for an aggregate with `event_version > from_version`,
    /// ordered by event version. Used for incremental replay.
    async fn load_events_from(
        &self,
        aggregate_id: Uuid,
        from_version: i64,
    ) -> Result<Vec<StoredEvent>, DomainError>;

    /// Load events across all streams in global commit order, skipping the
    /// first `from_position` events. Used to rebuild projections from
    /// scratch or to catch up.
    async fn load_all_events(&self, from_position: i64) -> Result<Vec<StoredEvent>, DomainError>;

    /// Append new events to an aggregate stream with optimistic concurrency.
    ///
    /// `expected_version` is the last persisted version of the stream
    /// (0 if the stream does not exist). Within one atomic transaction the
    /// store re-reads the stream head; on mismatch it fails with
    /// [`DomainError::ConcurrencyConflict`] and writes nothing. Otherwise
    /// the events are assigned versions `expected_version + 1 ..` and
    /// persisted all-or-nothing.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError>;
}
