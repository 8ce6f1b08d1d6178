//! Learnly — Quiz bounded context.
//!
//! One `QuizAttempt` aggregate per attempt stream: started with a
//! shuffled question order, answered one question at a time, completed
//! with a computed score.

pub mod application;
pub mod domain;
