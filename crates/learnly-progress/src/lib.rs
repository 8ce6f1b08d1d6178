//! Learnly — cross-context progress projections.
//!
//! In-memory read models fed by the event bus. Each projection is
//! idempotent, so at-least-once delivery and full rebuilds from the
//! global event log produce the same state.

pub mod lesson_completion;
pub mod streak;

pub use lesson_completion::LessonCompletionProjection;
pub use streak::StreakProjection;
