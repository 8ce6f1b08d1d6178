//! Lesson completion projection.
//!
//! Tracks which lessons each user has completed. Subscribed to
//! `lesson.completed`; the (user, lesson) key set makes redelivery a
//! no-op.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use learnly_core::error::DomainError;
use learnly_core::event_store::{EventStore, StoredEvent};
use learnly_lessons::domain::events::{LESSON_COMPLETED_EVENT_TYPE, LessonEventKind};
use learnly_messaging::{EventHandler, ProjectionError};

type CompletionSet = HashSet<(Uuid, Uuid)>;

/// Set of (user, lesson) pairs with a recorded completion.
#[derive(Debug, Default)]
pub struct LessonCompletionProjection {
    completions: Mutex<CompletionSet>,
}

impl LessonCompletionProjection {
    /// Creates an empty projection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the user has completed the lesson.
    #[must_use]
    pub fn is_completed(&self, user_id: Uuid, lesson_id: Uuid) -> bool {
        self.lock().contains(&(user_id, lesson_id))
    }

    /// Returns the number of distinct lessons the user has completed.
    #[must_use]
    pub fn completed_count(&self, user_id: Uuid) -> usize {
        self.lock().iter().filter(|(u, _)| *u == user_id).count()
    }

    /// Drops all state and replays the global event log through the
    /// projection.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Infrastructure`] if the log cannot be read
    /// or an event cannot be decoded.
    pub async fn rebuild(&self, store: &dyn EventStore) -> Result<(), DomainError> {
        let events = store.load_all_events(0).await?;
        self.lock().clear();
        for event in &events {
            self.handle(event)
                .await
                .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        }
        tracing::debug!(events = events.len(), "lesson completion projection rebuilt");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, CompletionSet> {
        self.completions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl EventHandler for LessonCompletionProjection {
    fn name(&self) -> &'static str {
        "lesson_completion_projection"
    }

    async fn handle(&self, event: &StoredEvent) -> Result<(), ProjectionError> {
        if event.event_type != LESSON_COMPLETED_EVENT_TYPE {
            return Ok(());
        }

        let kind: LessonEventKind = serde_json::from_value(event.payload.clone())
            .map_err(|e| ProjectionError(format!("undecodable lesson event: {e}")))?;
        match kind {
            LessonEventKind::LessonCompleted(payload) => {
                self.lock().insert((payload.user_id, payload.lesson_id));
                Ok(())
            }
            other => Err(ProjectionError(format!(
                "payload mismatch for {}: {other:?}",
                event.event_type
            ))),
        }
    }
}
