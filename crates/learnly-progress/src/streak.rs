//! Daily learning streak projection.
//!
//! Counts consecutive UTC calendar days on which a user completed a
//! lesson or a quiz attempt. Subscribed to `lesson.completed` and
//! `quiz.attempt_completed`; storing days in a set makes redelivery of
//! the same event a no-op.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use uuid::Uuid;

use learnly_core::error::DomainError;
use learnly_core::event_store::{EventStore, StoredEvent};
use learnly_lessons::domain::events::{LESSON_COMPLETED_EVENT_TYPE, LessonEventKind};
use learnly_messaging::{EventHandler, ProjectionError};
use learnly_quiz::domain::events::{ATTEMPT_COMPLETED_EVENT_TYPE, QuizEventKind};

type ActivityDays = HashMap<Uuid, BTreeSet<NaiveDate>>;

/// Per-user set of UTC days with at least one completion.
#[derive(Debug, Default)]
pub struct StreakProjection {
    days: Mutex<ActivityDays>,
}

impl StreakProjection {
    /// Creates an empty projection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the user's current streak as of `today`.
    ///
    /// The streak is the number of consecutive active days ending at
    /// `today` or yesterday: a user who was active yesterday but not yet
    /// today keeps the streak alive until the day rolls over without
    /// activity.
    #[must_use]
    pub fn current_streak(&self, user_id: Uuid, today: NaiveDate) -> u32 {
        let days = self.lock();
        let Some(active) = days.get(&user_id) else {
            return 0;
        };

        let start = if active.contains(&today) {
            today
        } else {
            let Some(yesterday) = today.checked_sub_days(Days::new(1)) else {
                return 0;
            };
            if !active.contains(&yesterday) {
                return 0;
            }
            yesterday
        };

        let mut streak = 0;
        let mut day = Some(start);
        while let Some(current) = day {
            if !active.contains(&current) {
                break;
            }
            streak += 1;
            day = current.checked_sub_days(Days::new(1));
        }
        streak
    }

    /// Returns the number of distinct active days recorded for a user.
    #[must_use]
    pub fn active_day_count(&self, user_id: Uuid) -> usize {
        self.lock().get(&user_id).map_or(0, BTreeSet::len)
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
        tracing::debug!(events = events.len(), "streak projection rebuilt");
        Ok(())
    }

    fn mark_active(&self, user_id: Uuid, day: NaiveDate) {
        self.lock().entry(user_id).or_default().insert(day);
    }

    fn lock(&self) -> MutexGuard<'_, ActivityDays> {
        self.days
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Extracts the completing user from a completion event's payload, or
/// `None` when the event is of a type this projection ignores.
fn completing_user(event: &StoredEvent) -> Result<Option<Uuid>, ProjectionError> {
    match event.event_type.as_str() {
        LESSON_COMPLETED_EVENT_TYPE => {
            let kind: LessonEventKind = serde_json::from_value(event.payload.clone())
                .map_err(|e| ProjectionError(format!("undecodable lesson event: {e}")))?;
            match kind {
                LessonEventKind::LessonCompleted(payload) => Ok(Some(payload.user_id)),
                other => Err(ProjectionError(format!(
                    "payload mismatch for {}: {other:?}",
                    event.event_type
                ))),
            }
        }
        ATTEMPT_COMPLETED_EVENT_TYPE => {
            let kind: QuizEventKind = serde_json::from_value(event.payload.clone())
                .map_err(|e| ProjectionError(format!("undecodable quiz event: {e}")))?;
            match kind {
                QuizEventKind::AttemptCompleted(payload) => Ok(Some(payload.user_id)),
                other => Err(ProjectionError(format!(
                    "payload mismatch for {}: {other:?}",
                    event.event_type
                ))),
            }
        }
        _ => Ok(None),
    }
}

#[async_trait]
impl EventHandler for StreakProjection {
    fn name(&self) -> &'static str {
        "streak_projection"
    }

    async fn handle(&self, event: &StoredEvent) -> Result<(), ProjectionError> {
        if let Some(user_id) = completing_user(event)? {
            self.mark_active(user_id, event.occurred_at.date_naive());
        }
        Ok(())
    }
}
