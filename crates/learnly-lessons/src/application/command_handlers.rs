//! Command handlers for the Lessons context.
//!
//! Same shape as the quiz handlers: load (or create), mutate, save.
//! Concurrency conflicts from `save` propagate to the dispatcher
//! unchanged.

use std::sync::Arc;

use async_trait::async_trait;

use learnly_core::aggregate::AggregateRoot;
use learnly_core::clock::Clock;
use learnly_core::error::DomainError;
use learnly_core::repository::AggregateRepository;
use learnly_messaging::CommandHandler;

use crate::domain::aggregates::LessonProgress;
use crate::domain::commands::{ArchiveLessonProgress, CompleteLesson, StartLesson, UnlockLesson};

/// Handles [`UnlockLesson`].
pub struct UnlockLessonHandler {
    repository: Arc<AggregateRepository<LessonProgress>>,
    clock: Arc<dyn Clock>,
}

impl UnlockLessonHandler {
    /// Creates the handler over the given repository and clock.
    #[must_use]
    pub fn new(
        repository: Arc<AggregateRepository<LessonProgress>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl CommandHandler<UnlockLesson> for UnlockLessonHandler {
    async fn handle(&self, command: UnlockLesson) -> Result<(), DomainError> {
        // An existing stream means the lesson was unlocked before; loading
        // it lets the aggregate reject the duplicate unlock itself.
        let mut progress = self
            .repository
            .get_by_id(command.progress_id)
            .await?
            .unwrap_or_else(|| LessonProgress::with_id(command.progress_id));

        progress.unlock(
            command.lesson_id,
            command.user_id,
            command.correlation_id,
            self.clock.as_ref(),
        )?;

        self.repository.save(&mut progress).await
    }
}

/// Handles [`StartLesson`].
pub struct StartLessonHandler {
    repository: Arc<AggregateRepository<LessonProgress>>,
    clock: Arc<dyn Clock>,
}

impl StartLessonHandler {
    /// Creates the handler over the given repository and clock.
    #[must_use]
    pub fn new(
        repository: Arc<AggregateRepository<LessonProgress>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl CommandHandler<StartLesson> for StartLessonHandler {
    async fn handle(&self, command: StartLesson) -> Result<(), DomainError> {
        let mut progress = self
            .repository
            .get_by_id(command.progress_id)
            .await?
            .ok_or(DomainError::AggregateNotFound(command.progress_id))?;

        progress.start(command.correlation_id, self.clock.as_ref())?;

        self.repository.save(&mut progress).await
    }
}

/// Handles [`CompleteLesson`].
pub struct CompleteLessonHandler {
    repository: Arc<AggregateRepository<LessonProgress>>,
    clock: Arc<dyn Clock>,
}

impl CompleteLessonHandler {
    /// Creates the handler over the given repository and clock.
    #[must_use]
    pub fn new(
        repository: Arc<AggregateRepository<LessonProgress>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl CommandHandler<CompleteLesson> for CompleteLessonHandler {
    async fn handle(&self, command: CompleteLesson) -> Result<(), DomainError> {
        let mut progress = self
            .repository
            .get_by_id(command.progress_id)
            .await?
            .ok_or(DomainError::AggregateNotFound(command.progress_id))?;

        progress.complete(command.correlation_id, self.clock.as_ref())?;

        self.repository.save(&mut progress).await
    }
}

/// Handles [`ArchiveLessonProgress`].
pub struct ArchiveLessonProgressHandler {
    repository: Arc<AggregateRepository<LessonProgress>>,
    clock: Arc<dyn Clock>,
}

impl ArchiveLessonProgressHandler {
    /// Creates the handler over the given repository and clock.
    #[must_use]
    pub fn new(
        repository: Arc<AggregateRepository<LessonProgress>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl CommandHandler<ArchiveLessonProgress> for ArchiveLessonProgressHandler {
    async fn handle(&self, command: ArchiveLessonProgress) -> Result<(), DomainError> {
        let mut progress = self
            .repository
            .get_by_id(command.progress_id)
            .await?
            .ok_or(DomainError::AggregateNotFound(command.progress_id))?;

        progress.archive(command.reason, command.correlation_id, self.clock.as_ref())?;

        self.repository.save(&mut progress).await
    }
}
