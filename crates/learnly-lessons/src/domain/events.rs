//! Domain events for the Lessons context.

use learnly_core::error::DomainError;
use learnly_core::event::{DomainEvent, EventMetadata};
use learnly_core::event_store::StoredEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type name for [`LessonUnlocked`].
pub const LESSON_UNLOCKED_EVENT_TYPE: &str = "lesson.unlocked";
/// Event type name for [`LessonStarted`].
pub const LESSON_STARTED_EVENT_TYPE: &str = "lesson.started";
/// Event type name for [`LessonCompleted`].
pub const LESSON_COMPLETED_EVENT_TYPE: &str = "lesson.completed";
/// Event type name for [`LessonArchived`].
pub const LESSON_ARCHIVED_EVENT_TYPE: &str = "lesson.archived";

/// Emitted when a lesson becomes available to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonUnlocked {
    /// The progress stream identifier.
    pub progress_id: Uuid,
    /// The lesson unlocked.
    pub lesson_id: Uuid,
    /// The user it was unlocked for.
    pub user_id: Uuid,
}

/// Emitted when the user opens an unlocked lesson for the first time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonStarted {
    /// The progress stream identifier.
    pub progress_id: Uuid,
    /// The lesson started.
    pub lesson_id: Uuid,
    /// The user who started it.
    pub user_id: Uuid,
}

/// Emitted when the user finishes a lesson.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonCompleted {
    /// The progress stream identifier.
    pub progress_id: Uuid,
    /// The lesson completed.
    pub lesson_id: Uuid,
    /// The user who completed it.
    pub user_id: Uuid,
}

/// Emitted when a progress stream is retired. Archival replaces
/// deletion: the history stays replayable, the aggregate just refuses
/// further mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonArchived {
    /// The progress stream identifier.
    pub progress_id: Uuid,
    /// Operator-supplied reason, if any.
    pub reason: Option<String>,
}

/// Event payload variants for the Lessons context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LessonEventKind {
    /// A lesson has been unlocked for a user.
    LessonUnlocked(LessonUnlocked),
    /// A lesson has been started.
    LessonStarted(LessonStarted),
    /// A lesson has been completed.
    LessonCompleted(LessonCompleted),
    /// The progress stream has been archived.
    LessonArchived(LessonArchived),
}

/// Domain event envelope for the Lessons context.
#[derive(Debug, Clone)]
pub struct LessonEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: LessonEventKind,
}

impl LessonEvent {
    /// Decodes a stored event back into the envelope form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload does not
    /// deserialize into a [`LessonEventKind`].
    pub fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError> {
        let kind: LessonEventKind = serde_json::from_value(stored.payload.clone())
            .map_err(|e| DomainError::Infrastructure(format!("undecodable lesson event: {e}")))?;
        Ok(Self {
            metadata: EventMetadata {
                event_id: stored.event_id,
                event_type: stored.event_type.clone(),
                aggregate_id: stored.aggregate_id,
                event_version: stored.event_version,
                correlation_id: stored.correlation_id,
                causation_id: stored.causation_id,
                occurred_at: stored.occurred_at,
            },
            kind,
        })
    }
}

impl DomainEvent for LessonEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            LessonEventKind::LessonUnlocked(_) => LESSON_UNLOCKED_EVENT_TYPE,
            LessonEventKind::LessonStarted(_) => LESSON_STARTED_EVENT_TYPE,
            LessonEventKind::LessonCompleted(_) => LESSON_COMPLETED_EVENT_TYPE,
            LessonEventKind::LessonArchived(_) => LESSON_ARCHIVED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("LessonEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
