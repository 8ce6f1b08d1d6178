//! Application layer for the Quiz context.

pub mod command_handlers;
pub mod query_handlers;

pub use command_handlers::{
    CompleteQuizAttemptHandler, StartQuizAttemptHandler, SubmitAnswerHandler,
};
pub use query_handlers::GetQuizAttemptHandler;
