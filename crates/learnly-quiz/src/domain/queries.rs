//! Queries for the Quiz context.

use learnly_core::query::Query;
use serde::Serialize;
use uuid::Uuid;

use super::aggregates::AttemptStatus;

/// Read model for one quiz attempt, rebuilt from its event stream.
#[derive(Debug, Clone, Serialize)]
pub struct QuizAttemptView {
    /// The attempt identifier.
    pub attempt_id: Uuid,
    /// The quiz under attempt.
    pub quiz_id: Option<Uuid>,
    /// The user taking the quiz.
    pub user_id: Option<Uuid>,
    /// Lifecycle status.
    pub status: AttemptStatus,
    /// The fixed question presentation order.
    pub question_order: Vec<Uuid>,
    /// Number of answered questions.
    pub answered: usize,
    /// Number of correct answers.
    pub correct: u32,
    /// Stream version at read time.
    pub version: i64,
}

/// Fetch the current state of one attempt.
#[derive(Debug, Clone)]
pub struct GetQuizAttempt {
    /// The attempt to fetch.
    pub attempt_id: Uuid,
}

impl Query for GetQuizAttempt {
    type Output = QuizAttemptView;

    fn query_type(&self) -> &'static str {
        "quiz.get_attempt"
    }
}
