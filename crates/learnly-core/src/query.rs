//! Query abstractions.

/// Trait that all queries implement. Queries express intent to read and
/// must never produce events.
pub trait Query: Send + Sync + std::fmt::Debug {
    /// The result type produced by handling this query.
    type Output: Send;

    /// The type name for this query (for logging/routing).
    fn query_type(&self) -> &'static str;
}
