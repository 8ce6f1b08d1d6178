//! Domain events for the Quiz context.

use learnly_core::error::DomainError;
use learnly_core::event::{DomainEvent, EventMetadata};
use learnly_core::event_store::StoredEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type name for [`AttemptStarted`].
pub const ATTEMPT_STARTED_EVENT_TYPE: &str = "quiz.attempt_started";
/// Event type name for [`AnswerSubmitted`].
pub const ANSWER_SUBMITTED_EVENT_TYPE: &str = "quiz.answer_submitted";
/// Event type name for [`AttemptCompleted`].
pub const ATTEMPT_COMPLETED_EVENT_TYPE: &str = "quiz.attempt_completed";

/// Emitted when a quiz attempt is started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptStarted {
    /// The attempt identifier.
    pub attempt_id: Uuid,
    /// The quiz being attempted.
    pub quiz_id: Uuid,
    /// The user taking the quiz.
    pub user_id: Uuid,
    /// The order questions are presented in, fixed at start time so
    /// replay never reshuffles.
    pub question_order: Vec<Uuid>,
}

/// Emitted when an answer is submitted for one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSubmitted {
    /// The attempt identifier.
    pub attempt_id: Uuid,
    /// The question answered.
    pub question_id: Uuid,
    /// The option the user selected.
    pub selected_option: u32,
    /// Whether the selected option was correct.
    pub correct: bool,
}

/// Emitted when an attempt is completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptCompleted {
    /// The attempt identifier.
    pub attempt_id: Uuid,
    /// The user who took the quiz; carried so projections keyed by user
    /// need not join back to the start event.
    pub user_id: Uuid,
    /// Number of correctly answered questions.
    pub score: u32,
    /// Number of questions in the attempt.
    pub total: u32,
}

/// Event payload variants for the Quiz context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QuizEventKind {
    /// An attempt has been started.
    AttemptStarted(AttemptStarted),
    /// An answer has been submitted.
    AnswerSubmitted(AnswerSubmitted),
    /// An attempt has been completed.
    AttemptCompleted(AttemptCompleted),
}

/// Domain event envelope for the Quiz context.
#[derive(Debug, Clone)]
pub struct QuizEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: QuizEventKind,
}

impl QuizEvent {
    /// Decodes a stored event back into the envelope form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload does not
    /// deserialize into a [`QuizEventKind`].
    pub fn from_stored(stored: &StoredEvent) -> Result<Self, DomainError> {
        let kind: QuizEventKind = serde_json::from_value(stored.payload.clone())
            .map_err(|e| DomainError::Infrastructure(format!("undecodable quiz event: {e}")))?;
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

impl DomainEvent for QuizEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            QuizEventKind::AttemptStarted(_) => ATTEMPT_STARTED_EVENT_TYPE,
            QuizEventKind::AnswerSubmitted(_) => ANSWER_SUBMITTED_EVENT_TYPE,
            QuizEventKind::AttemptCompleted(_) => ATTEMPT_COMPLETED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("QuizEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
