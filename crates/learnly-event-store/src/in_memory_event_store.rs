//! In-memory implementation of the `EventStore` trait.
//!
//! Honors the same optimistic-concurrency contract as the PostgreSQL
//! store. Backs command-handler tests and local development without a
//! database.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use learnly_core::error::DomainError;
use learnly_core::event_store::{EventStore, StoredEvent};

/// Event store holding all events in a single globally-ordered log.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    // Append order is global commit order; per-stream order follows from
    // versions being assigned under the same lock.
    log: Mutex<Vec<StoredEvent>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of events across all streams.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    /// Returns true when no events have been appended.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.lock().unwrap().is_empty()
    }

    fn stream_head(log: &[StoredEvent], aggregate_id: Uuid) -> i64 {
        log.iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.event_version)
            .max()
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        self.load_events_from(aggregate_id, 0).await
    }

    async fn load_events_from(
        &self,
        aggregate_id: Uuid,
        from_version: i64,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let log = self.log.lock().map_err(|_| poisoned())?;
        let mut events: Vec<StoredEvent> = log
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id && e.event_version > from_version)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.event_version);
        Ok(events)
    }

    async fn load_all_events(&self, from_position: i64) -> Result<Vec<StoredEvent>, DomainError> {
        let log = self.log.lock().map_err(|_| poisoned())?;
        let skip = usize::try_from(from_position).unwrap_or(0);
        Ok(log.iter().skip(skip).cloned().collect())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut log = self.log.lock().map_err(|_| poisoned())?;
        let actual = Self::stream_head(&log, aggregate_id);
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        for (i, event) in events.iter().enumerate() {
            #[allow(clippy::cast_possible_wrap)]
            let event_version = expected_version + i as i64 + 1;
            let mut stored = event.clone();
            stored.aggregate_id = aggregate_id;
            stored.event_version = event_version;
            log.push(stored);
        }
        Ok(())
    }
}

fn poisoned() -> DomainError {
    DomainError::Infrastructure("event store mutex poisoned".to_owned())
}
