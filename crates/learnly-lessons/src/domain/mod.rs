//! Domain model for the Lessons context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod queries;
