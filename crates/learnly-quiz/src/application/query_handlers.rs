//! Query handlers for the Quiz context.
//!
//! Wired with read-only access to the event store; replay is the only
//! computation, no events are produced.

use std::sync::Arc;

use async_trait::async_trait;

use learnly_core::aggregate::AggregateRoot;
use learnly_core::error::DomainError;
use learnly_core::event_store::EventStore;
use learnly_core::repository::replay_aggregate;
use learnly_messaging::QueryHandler;

use crate::domain::aggregates::QuizAttempt;
use crate::domain::queries::{GetQuizAttempt, QuizAttemptView};

/// Handles [`GetQuizAttempt`] by replaying the attempt's stream.
pub struct GetQuizAttemptHandler {
    store: Arc<dyn EventStore>,
}

impl GetQuizAttemptHandler {
    /// Creates the handler over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl QueryHandler<GetQuizAttempt> for GetQuizAttemptHandler {
    async fn handle(&self, query: GetQuizAttempt) -> Result<QuizAttemptView, DomainError> {
        let stored_events = self.store.load_events(query.attempt_id).await?;
        if stored_events.is_empty() {
            return Err(DomainError::AggregateNotFound(query.attempt_id));
        }

        let attempt: QuizAttempt = replay_aggregate(query.attempt_id, &stored_events)?;
        Ok(QuizAttemptView {
            attempt_id: attempt.aggregate_id(),
            quiz_id: attempt.quiz_id(),
            user_id: attempt.user_id(),
            status: attempt.status(),
            question_order: attempt.question_order().to_vec(),
            answered: attempt.answered_count(),
            correct: attempt.correct_count(),
            version: attempt.version(),
        })
    }
}
