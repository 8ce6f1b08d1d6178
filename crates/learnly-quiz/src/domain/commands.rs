//! Commands for the Quiz context.

use learnly_core::command::Command;
use uuid::Uuid;

/// Start a new quiz attempt for a user.
#[derive(Debug, Clone)]
pub struct StartQuizAttempt {
    /// Unique identifier of this command instance.
    pub command_id: Uuid,
    /// Correlation id carried onto the emitted events.
    pub correlation_id: Uuid,
    /// The stream id of the attempt to create.
    pub attempt_id: Uuid,
    /// The quiz to attempt.
    pub quiz_id: Uuid,
    /// The user taking the quiz.
    pub user_id: Uuid,
    /// The questions to present, pre-shuffle.
    pub question_ids: Vec<Uuid>,
}

impl Command for StartQuizAttempt {
    fn command_type(&self) -> &'static str {
        "quiz.start_attempt"
    }

    fn command_id(&self) -> Uuid {
        self.command_id
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Submit one graded answer on an in-progress attempt.
#[derive(Debug, Clone)]
pub struct SubmitAnswer {
    /// Unique identifier of this command instance.
    pub command_id: Uuid,
    /// Correlation id carried onto the emitted events.
    pub correlation_id: Uuid,
    /// The attempt to answer on.
    pub attempt_id: Uuid,
    /// The question being answered.
    pub question_id: Uuid,
    /// The option the user selected.
    pub selected_option: u32,
    /// Whether the selection was graded correct.
    pub correct: bool,
}

impl Command for SubmitAnswer {
    fn command_type(&self) -> &'static str {
        "quiz.submit_answer"
    }

    fn command_id(&self) -> Uuid {
        self.command_id
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Complete an attempt once every question is answered.
#[derive(Debug, Clone)]
pub struct CompleteQuizAttempt {
    /// Unique identifier of this command instance.
    pub command_id: Uuid,
    /// Correlation id carried onto the emitted events.
    pub correlation_id: Uuid,
    /// The attempt to complete.
    pub attempt_id: Uuid,
}

impl Command for CompleteQuizAttempt {
    fn command_type(&self) -> &'static str {
        "quiz.complete_attempt"
    }

    fn command_id(&self) -> Uuid {
        self.command_id
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
