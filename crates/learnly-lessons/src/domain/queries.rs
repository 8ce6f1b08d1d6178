//! Queries for the Lessons context.

use learnly_core::query::Query;
use serde::Serialize;
use uuid::Uuid;

use super::aggregates::ProgressStatus;

/// Read model for one lesson-progress stream.
#[derive(Debug, Clone, Serialize)]
pub struct LessonProgressView {
    /// The progress stream identifier.
    pub progress_id: Uuid,
    /// The lesson tracked.
    pub lesson_id: Option<Uuid>,
    /// The user tracked.
    pub user_id: Option<Uuid>,
    /// Lifecycle status.
    pub status: ProgressStatus,
    /// Stream version at read time.
    pub version: i64,
}

/// Fetch the current state of one progress stream.
#[derive(Debug, Clone)]
pub struct GetLessonProgress {
    /// The progress stream to fetch.
    pub progress_id: Uuid,
}

impl Query for GetLessonProgress {
    type Output = LessonProgressView;

    fn query_type(&self) -> &'static str {
        "lesson.get_progress"
    }
}
