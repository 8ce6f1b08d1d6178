//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// No handler is registered for a dispatched command or query.
    /// Indicates a wiring bug, not an expected runtime condition.
    #[error("no handler registered for {0}")]
    NoHandlerRegistered(String),

    /// An operation the event-sourced model rejects by contract.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
