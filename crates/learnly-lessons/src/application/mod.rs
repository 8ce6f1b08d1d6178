//! Application layer for the Lessons context.

pub mod command_handlers;
pub mod query_handlers;

pub use command_handlers::{
    ArchiveLessonProgressHandler, CompleteLessonHandler, StartLessonHandler, UnlockLessonHandler,
};
pub use query_handlers::GetLessonProgressHandler;
