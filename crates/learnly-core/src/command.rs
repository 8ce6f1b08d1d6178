//! Command abstractions.

use uuid::Uuid;

/// Trait that all commands implement. Commands express intent to mutate
/// exactly one aggregate and are immutable once constructed.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Unique identifier of this command instance.
    fn command_id(&self) -> Uuid;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;
}
