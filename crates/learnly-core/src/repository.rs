//! Generic aggregate repository.
//!
//! Rehydrates aggregates by replaying their event stream and persists
//! uncommitted events through the event store's optimistic-concurrency
//! append, publishing them post-commit.

use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::error::DomainError;
use crate::event_store::{EventStore, StoredEvent};
use crate::publisher::EventPublisher;

/// Replays a stored event list, in order, into a fresh aggregate.
///
/// Pure with respect to the event list: two replays of the same list
/// yield equal observable state and version. Shared by
/// [`AggregateRepository::get_by_id`] and by query handlers that
/// reconstitute an aggregate for a read-only view.
///
/// # Errors
///
/// Returns [`DomainError::Infrastructure`] if decoding a stored event
/// fails.
pub fn replay_aggregate<A: AggregateRoot>(
    id: Uuid,
    stored_events: &[StoredEvent],
) -> Result<A, DomainError> {
    let mut aggregate = A::with_id(id);
    for stored in stored_events {
        let event = A::event_from_stored(stored)?;
        aggregate.apply(&event);
    }
    Ok(aggregate)
}

/// Loads and saves one aggregate type against an [`EventStore`].
pub struct AggregateRepository<A: AggregateRoot> {
    store: Arc<dyn EventStore>,
    publisher: Arc<dyn EventPublisher>,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A: AggregateRoot> AggregateRepository<A> {
    /// Creates a repository over the given store and publisher.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            store,
            publisher,
            _aggregate: PhantomData,
        }
    }

    /// Loads an aggregate by replaying its stream.
    ///
    /// Returns `Ok(None)` when the stream has no events (the aggregate
    /// does not exist). Replay is a pure function of the event list: two
    /// replays of the same stream yield equal observable state.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] if loading or decoding a
    /// stored event fails.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<A>, DomainError> {
        let stored_events = self.store.load_events(id).await?;
        if stored_events.is_empty() {
            return Ok(None);
        }
        replay_aggregate(id, &stored_events).map(Some)
    }

    /// Persists the aggregate's uncommitted events and publishes them.
    ///
    /// A no-op when the buffer is empty: no store write, no publish. The
    /// expected version handed to the store is the aggregate's version
    /// minus the buffered event count, i.e. the version the stream had
    /// when this instance was loaded. On success the same events are
    /// published in order and the buffer is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::ConcurrencyConflict`] unchanged when the
    /// stream advanced underneath this instance; nothing is published and
    /// the buffer is left intact so the caller can reload and retry.
    pub async fn save(&self, aggregate: &mut A) -> Result<(), DomainError> {
        let uncommitted = aggregate.uncommitted_events();
        if uncommitted.is_empty() {
            return Ok(());
        }

        #[allow(clippy::cast_possible_wrap)]
        let expected_version = aggregate.version() - uncommitted.len() as i64;
        let stored_events: Vec<StoredEvent> =
            uncommitted.iter().map(StoredEvent::from_domain).collect();

        self.store
            .append_events(aggregate.aggregate_id(), expected_version, &stored_events)
            .await?;

        tracing::debug!(
            aggregate_id = %aggregate.aggregate_id(),
            appended = stored_events.len(),
            version = aggregate.version(),
            "aggregate saved"
        );

        self.publisher.publish(&stored_events).await;
        aggregate.mark_committed();
        Ok(())
    }

    /// Deletion is unsupported by contract: lifecycle end is modeled as a
    /// domain event (e.g. archival), never stream removal.
    ///
    /// # Errors
    ///
    /// Always returns [`DomainError::UnsupportedOperation`].
    pub fn delete(&self, _id: Uuid) -> Result<(), DomainError> {
        Err(DomainError::UnsupportedOperation(
            "event-sourced aggregates cannot be deleted; record a lifecycle event instead",
        ))
    }
}
