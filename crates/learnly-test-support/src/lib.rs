//! Shared test mocks and utilities for Learnly.

mod clock;
mod event_store;
mod publisher;
mod rng;
mod tracing;

pub use clock::FixedClock;
pub use event_store::{EmptyEventStore, FailingEventStore, RecordingEventStore};
pub use publisher::{NullPublisher, RecordingPublisher};
pub use rng::{MockRng, SequenceRng};
pub use tracing::init_tracing;
