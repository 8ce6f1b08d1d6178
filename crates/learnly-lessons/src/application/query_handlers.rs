//! Query handlers for the Lessons context.

use std::sync::Arc;

use async_trait::async_trait;

use learnly_core::aggregate::AggregateRoot;
use learnly_core::error::DomainError;
use learnly_core::event_store::EventStore;
use learnly_core::repository::replay_aggregate;
use learnly_messaging::QueryHandler;

use crate::domain::aggregates::LessonProgress;
use crate::domain::queries::{GetLessonProgress, LessonProgressView};

/// Handles [`GetLessonProgress`] by replaying the progress stream.
pub struct GetLessonProgressHandler {
    store: Arc<dyn EventStore>,
}

impl GetLessonProgressHandler {
    /// Creates the handler over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl QueryHandler<GetLessonProgress> for GetLessonProgressHandler {
    async fn handle(&self, query: GetLessonProgress) -> Result<LessonProgressView, DomainError> {
        let stored_events = self.store.load_events(query.progress_id).await?;
        if stored_events.is_empty() {
            return Err(DomainError::AggregateNotFound(query.progress_id));
        }

        let progress: LessonProgress = replay_aggregate(query.progress_id, &stored_events)?;
        Ok(LessonProgressView {
            progress_id: progress.aggregate_id(),
            lesson_id: progress.lesson_id(),
            user_id: progress.user_id(),
            status: progress.status(),
            version: progress.version(),
        })
    }
}
