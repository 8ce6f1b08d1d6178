//! Learnly — Lessons bounded context.
//!
//! One `LessonProgress` aggregate per (user, lesson) stream: unlocked,
//! started, completed. Progress is never deleted; retiring a stream is
//! an archival event like any other.

pub mod application;
pub mod domain;
