//! Aggregate root abstraction.
//!
//! Aggregates embed an [`EventSourcedEntity`] rather than extending a base
//! type: the helper owns the identifier, the version counter, and the
//! uncommitted-event buffer, and the [`AggregateRoot`] trait is implemented
//! by delegation.

use uuid::Uuid;

use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::event_store::StoredEvent;

/// Identity, version, and uncommitted-event buffer shared by every
/// aggregate via composition.
///
/// `version` always equals the highest event version applied to this
/// instance, whether replayed from history or newly buffered: [`record`]
/// bumps it by one per event, [`replayed`] bumps it once per applied
/// historical event, and [`mark_committed`] leaves it untouched.
///
/// [`record`]: EventSourcedEntity::record
/// [`replayed`]: EventSourcedEntity::replayed
/// [`mark_committed`]: EventSourcedEntity::mark_committed
#[derive(Debug)]
pub struct EventSourcedEntity<E> {
    id: Uuid,
    version: i64,
    uncommitted: Vec<E>,
}

impl<E> EventSourcedEntity<E> {
    /// Creates a fresh entity at version 0 with no history.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            uncommitted: Vec::new(),
        }
    }

    /// Returns the aggregate identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the current version.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns the version the next recorded event will carry.
    #[must_use]
    pub fn next_event_version(&self) -> i64 {
        self.version + 1
    }

    /// Buffers a newly emitted event and bumps the version by one.
    ///
    /// The event must already carry [`next_event_version`] in its metadata;
    /// mutators construct it immediately before calling `record`.
    ///
    /// [`next_event_version`]: EventSourcedEntity::next_event_version
    pub fn record(&mut self, event: E) {
        self.version += 1;
        self.uncommitted.push(event);
    }

    /// Advances the version for one historical event applied during replay.
    /// Replayed events are never buffered.
    pub fn replayed(&mut self) {
        self.version += 1;
    }

    /// Returns the events recorded since the last commit, in emission order.
    #[must_use]
    pub fn uncommitted(&self) -> &[E] {
        &self.uncommitted
    }

    /// Clears the uncommitted buffer after persistence. The version is
    /// unchanged; recorded events already bumped it at emission time.
    pub fn mark_committed(&mut self) {
        self.uncommitted.clear();
    }
}

/// Trait for aggregate roots that reconstitute from event history.
pub trait AggregateRoot: Send + Sync + Sized {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Creates a fresh instance at version 0 for the given stream id,
    /// ready for replay or for its first command.
    fn with_id(id: Uuid) -> Self;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the current version (highest event version applied).
    fn version(&self) -> i64;

    /// Apply a historical event to mutate internal state during
    /// reconstitution. Must produce exactly the state transition the live
    /// mutator produced when the event was first emitted.
    fn apply(&mut self, event: &Self::Event);

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence.
    fn mark_committed(&mut self);

    /// Decodes a stored event back into the aggregate's event type.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] if the payload does not
    /// deserialize into a known event kind.
    fn event_from_stored(stored: &StoredEvent) -> Result<Self::Event, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_bumps_version_and_buffers_in_order() {
        // Arrange
        let mut entity: EventSourcedEntity<&str> = EventSourcedEntity::new(Uuid::new_v4());

        // Act
        assert_eq!(entity.next_event_version(), 1);
        entity.record("first");
        assert_eq!(entity.next_event_version(), 2);
        entity.record("second");

        // Assert
        assert_eq!(entity.version(), 2);
        assert_eq!(entity.uncommitted(), &["first", "second"]);
    }

    #[test]
    fn test_mark_committed_clears_buffer_and_keeps_version() {
        // Arrange
        let mut entity: EventSourcedEntity<&str> = EventSourcedEntity::new(Uuid::new_v4());
        entity.record("only");

        // Act
        entity.mark_committed();

        // Assert
        assert_eq!(entity.version(), 1);
        assert!(entity.uncommitted().is_empty());
        assert_eq!(entity.next_event_version(), 2);
    }

    #[test]
    fn test_replayed_advances_version_without_buffering() {
        // Arrange
        let mut entity: EventSourcedEntity<&str> = EventSourcedEntity::new(Uuid::new_v4());

        // Act
        entity.replayed();
        entity.replayed();
        entity.replayed();

        // Assert
        assert_eq!(entity.version(), 3);
        assert!(entity.uncommitted().is_empty());
    }
}
