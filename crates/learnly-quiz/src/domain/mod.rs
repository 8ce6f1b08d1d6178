//! Domain model for the Quiz context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod queries;
