//! Event store implementations for Learnly.
//!
//! [`PgEventStore`](pg_event_store::PgEventStore) is the production
//! store; [`InMemoryEventStore`](in_memory_event_store::InMemoryEventStore)
//! honors the same contract for tests and local development.

pub mod in_memory_event_store;
pub mod pg_event_store;
pub mod schema;

pub use in_memory_event_store::InMemoryEventStore;
pub use pg_event_store::PgEventStore;
