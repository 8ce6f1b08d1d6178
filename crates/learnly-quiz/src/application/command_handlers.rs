//! Command handlers for the Quiz context.
//!
//! Each handler owns a repository over the `QuizAttempt` aggregate and
//! follows the same shape: load (or create), mutate, save. Concurrency
//! conflicts from `save` propagate to the dispatcher unchanged.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use learnly_core::aggregate::AggregateRoot;
use learnly_core::clock::Clock;
use learnly_core::error::DomainError;
use learnly_core::repository::AggregateRepository;
use learnly_core::rng::DeterministicRng;
use learnly_messaging::CommandHandler;

use crate::domain::aggregates::QuizAttempt;
use crate::domain::commands::{CompleteQuizAttempt, StartQuizAttempt, SubmitAnswer};

/// Handles [`StartQuizAttempt`].
pub struct StartQuizAttemptHandler {
    repository: Arc<AggregateRepository<QuizAttempt>>,
    clock: Arc<dyn Clock>,
    rng: Mutex<Box<dyn DeterministicRng>>,
}

impl StartQuizAttemptHandler {
    /// Creates the handler over the given repository, clock, and RNG.
    #[must_use]
    pub fn new(
        repository: Arc<AggregateRepository<QuizAttempt>>,
        clock: Arc<dyn Clock>,
        rng: Box<dyn DeterministicRng>,
    ) -> Self {
        Self {
            repository,
            clock,
            rng: Mutex::new(rng),
        }
    }

    // The RNG itself stays coherent across a panicked borrower.
    fn rng(&self) -> MutexGuard<'_, Box<dyn DeterministicRng>> {
        self.rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl CommandHandler<StartQuizAttempt> for StartQuizAttemptHandler {
    async fn handle(&self, command: StartQuizAttempt) -> Result<(), DomainError> {
        // An existing stream means the attempt was started before; loading
        // it lets the aggregate reject the duplicate start itself.
        let mut attempt = self
            .repository
            .get_by_id(command.attempt_id)
            .await?
            .unwrap_or_else(|| QuizAttempt::with_id(command.attempt_id));

        {
            let mut rng = self.rng();
            attempt.start(
                command.quiz_id,
                command.user_id,
                command.question_ids,
                command.correlation_id,
                self.clock.as_ref(),
                rng.as_mut(),
            )?;
        }

        self.repository.save(&mut attempt).await
    }
}

/// Handles [`SubmitAnswer`].
pub struct SubmitAnswerHandler {
    repository: Arc<AggregateRepository<QuizAttempt>>,
    clock: Arc<dyn Clock>,
}

impl SubmitAnswerHandler {
    /// Creates the handler over the given repository and clock.
    #[must_use]
    pub fn new(repository: Arc<AggregateRepository<QuizAttempt>>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl CommandHandler<SubmitAnswer> for SubmitAnswerHandler {
    async fn handle(&self, command: SubmitAnswer) -> Result<(), DomainError> {
        let mut attempt = self
            .repository
            .get_by_id(command.attempt_id)
            .await?
            .ok_or(DomainError::AggregateNotFound(command.attempt_id))?;

        attempt.submit_answer(
            command.question_id,
            command.selected_option,
            command.correct,
            command.correlation_id,
            self.clock.as_ref(),
        )?;

        self.repository.save(&mut attempt).await
    }
}

/// Handles [`CompleteQuizAttempt`].
pub struct CompleteQuizAttemptHandler {
    repository: Arc<AggregateRepository<QuizAttempt>>,
    clock: Arc<dyn Clock>,
}

impl CompleteQuizAttemptHandler {
    /// Creates the handler over the given repository and clock.
    #[must_use]
    pub fn new(repository: Arc<AggregateRepository<QuizAttempt>>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl CommandHandler<CompleteQuizAttempt> for CompleteQuizAttemptHandler {
    async fn handle(&self, command: CompleteQuizAttempt) -> Result<(), DomainError> {
        let mut attempt = self
            .repository
            .get_by_id(command.attempt_id)
            .await?
            .ok_or(DomainError::AggregateNotFound(command.attempt_id))?;

        attempt.complete(command.correlation_id, self.clock.as_ref())?;

        self.repository.save(&mut attempt).await
    }
}
