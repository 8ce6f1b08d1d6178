//! Aggregate roots for the Lessons context.

use learnly_core::aggregate::{AggregateRoot, EventSourcedEntity};
use learnly_core::clock::Clock;
use learnly_core::error::DomainError;
use learnly_core::event::EventMetadata;
use learnly_core::event_store::StoredEvent;
use serde::Serialize;
use uuid::Uuid;

use super::events::{
    LESSON_ARCHIVED_EVENT_TYPE, LESSON_COMPLETED_EVENT_TYPE, LESSON_STARTED_EVENT_TYPE,
    LESSON_UNLOCKED_EVENT_TYPE, LessonArchived, LessonCompleted, LessonEvent, LessonEventKind,
    LessonStarted, LessonUnlocked,
};

/// Lifecycle state of a lesson-progress stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressStatus {
    /// The stream exists but no unlock event has been applied yet.
    Locked,
    /// Unlocked, not yet opened.
    Unlocked,
    /// Opened at least once.
    InProgress,
    /// Finished.
    Completed,
    /// Retired; refuses all further mutation.
    Archived,
}

/// The aggregate root tracking one user's progress through one lesson.
#[derive(Debug)]
pub struct LessonProgress {
    entity: EventSourcedEntity<LessonEvent>,
    status: ProgressStatus,
    lesson_id: Option<Uuid>,
    user_id: Option<Uuid>,
}

impl LessonProgress {
    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> ProgressStatus {
        self.status
    }

    /// Returns the lesson tracked, once unlocked.
    #[must_use]
    pub fn lesson_id(&self) -> Option<Uuid> {
        self.lesson_id
    }

    /// Returns the user tracked, once unlocked.
    #[must_use]
    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    /// Unlocks the lesson for a user, producing a `LessonUnlocked` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the stream was already
    /// unlocked or is archived.
    pub fn unlock(
        &mut self,
        lesson_id: Uuid,
        user_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_not_archived()?;
        if self.status != ProgressStatus::Locked {
            return Err(DomainError::Validation(format!(
                "lesson progress {} already unlocked",
                self.entity.id()
            )));
        }

        let kind = LessonEventKind::LessonUnlocked(LessonUnlocked {
            progress_id: self.entity.id(),
            lesson_id,
            user_id,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Marks the lesson as opened, producing a `LessonStarted` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless the stream is in the
    /// `Unlocked` state.
    pub fn start(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        self.require_not_archived()?;
        if self.status != ProgressStatus::Unlocked {
            return Err(DomainError::Validation(format!(
                "lesson progress {} cannot start from {:?}",
                self.entity.id(),
                self.status
            )));
        }

        let kind = LessonEventKind::LessonStarted(LessonStarted {
            progress_id: self.entity.id(),
            lesson_id: self.lesson_id.unwrap_or_default(),
            user_id: self.user_id.unwrap_or_default(),
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Marks the lesson as finished, producing a `LessonCompleted` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` unless the stream is in the
    /// `InProgress` state.
    pub fn complete(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        self.require_not_archived()?;
        if self.status != ProgressStatus::InProgress {
            return Err(DomainError::Validation(format!(
                "lesson progress {} cannot complete from {:?}",
                self.entity.id(),
                self.status
            )));
        }

        let kind = LessonEventKind::LessonCompleted(LessonCompleted {
            progress_id: self.entity.id(),
            lesson_id: self.lesson_id.unwrap_or_default(),
            user_id: self.user_id.unwrap_or_default(),
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Retires the stream, producing a `LessonArchived` event. The
    /// history stays replayable; only future mutation is refused.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the stream was never
    /// unlocked or is already archived.
    pub fn archive(
        &mut self,
        reason: Option<String>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.require_not_archived()?;
        if self.status == ProgressStatus::Locked {
            return Err(DomainError::Validation(format!(
                "lesson progress {} was never unlocked",
                self.entity.id()
            )));
        }

        let kind = LessonEventKind::LessonArchived(LessonArchived {
            progress_id: self.entity.id(),
            reason,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    fn require_not_archived(&self) -> Result<(), DomainError> {
        if self.status == ProgressStatus::Archived {
            return Err(DomainError::Validation(format!(
                "lesson progress {} is archived",
                self.entity.id()
            )));
        }
        Ok(())
    }

    fn record(&mut self, kind: LessonEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        self.when(&kind);
        let event_type = match &kind {
            LessonEventKind::LessonUnlocked(_) => LESSON_UNLOCKED_EVENT_TYPE,
            LessonEventKind::LessonStarted(_) => LESSON_STARTED_EVENT_TYPE,
            LessonEventKind::LessonCompleted(_) => LESSON_COMPLETED_EVENT_TYPE,
            LessonEventKind::LessonArchived(_) => LESSON_ARCHIVED_EVENT_TYPE,
        };
        let event = LessonEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: event_type.to_owned(),
                aggregate_id: self.entity.id(),
                event_version: self.entity.next_event_version(),
                correlation_id,
                causation_id: correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        };
        self.entity.record(event);
    }

    // The single state-transition function used by live mutators and by
    // replay.
    fn when(&mut self, kind: &LessonEventKind) {
        match kind {
            LessonEventKind::LessonUnlocked(payload) => {
                self.status = ProgressStatus::Unlocked;
                self.lesson_id = Some(payload.lesson_id);
                self.user_id = Some(payload.user_id);
            }
            LessonEventKind::LessonStarted(_) => {
                self.status = ProgressStatus::InProgress;
            }
            LessonEventKind::LessonCompleted(_) => {
                self.status = ProgressStatus::Completed;
            }
            LessonEventKind::LessonArchived(_) => {
                self.status = ProgressStatus::Archived;
            }
        }
    }
}

impl AggregateRoot for LessonProgress {
    type Event = LessonEvent;

    fn with_id(id: Uuid) -> Self {
        Self {
            entity: EventSourcedEntity::new(id),
            status: ProgressStatus::Locked,
            lesson_id: None,
            user_id: None,
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.entity.id()
    }

    fn version(&self) -> i64 {
        self.entity.version()
    }

    fn apply(&mut self, event: &Self::Event) {
        self.when(&event.kind);
        self.entity.replayed();
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        self.entity.uncommitted()
    }

    fn mark_committed(&mut self) {
        self.entity.mark_committed();
    }

    fn event_from_stored(stored: &StoredEvent) -> Result<Self::Event, DomainError> {
        LessonEvent::from_stored(stored)
    }
}
