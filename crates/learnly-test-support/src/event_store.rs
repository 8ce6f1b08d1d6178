//! Test stores — mock `EventStore` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use learnly_core::error::DomainError;
use learnly_core::event_store::{EventStore, StoredEvent};
use uuid::Uuid;

/// An event store that serves a configured event list from every load and
/// records all `append_events` calls without enforcing the version check.
/// Use it to assert what a handler tried to persist.
#[derive(Debug)]
pub struct RecordingEventStore {
    load_result: Mutex<Vec<StoredEvent>>,
    appended: Mutex<Vec<(Uuid, i64, Vec<StoredEvent>)>>,
}

impl RecordingEventStore {
    /// Create a new recording store that will return `load_result` from
    /// every `load_events` call.
    #[must_use]
    pub fn new(load_result: Vec<StoredEvent>) -> Self {
        Self {
            load_result: Mutex::new(load_result),
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all append calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn appended_events(&self) -> Vec<(Uuid, i64, Vec<StoredEvent>)> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for RecordingEventStore {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.load_result.lock().unwrap().clone())
    }

    async fn load_events_from(
        &self,
        aggregate_id: Uuid,
        from_version: i64,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .load_events(aggregate_id)
            .await?
            .into_iter()
            .filter(|e| e.event_version > from_version)
            .collect())
    }

    async fn load_all_events(&self, _from_position: i64) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.load_result.lock().unwrap().clone())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((aggregate_id, expected_version, events.to_vec()));
        Ok(())
    }
}

/// An event store that always returns an empty event list and silently
/// accepts appends. Useful for "aggregate not found" scenarios and
/// creation commands.
#[derive(Debug)]
pub struct EmptyEventStore;

#[async_trait]
impl EventStore for EmptyEventStore {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn load_events_from(
        &self,
        _aggregate_id: Uuid,
        _from_version: i64,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn load_all_events(&self, _from_position: i64) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

/// An event store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load_events_from(
        &self,
        _aggregate_id: Uuid,
        _from_version: i64,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load_all_events(&self, _from_position: i64) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
