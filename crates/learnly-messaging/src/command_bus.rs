//! Command bus — routes each command to exactly one registered handler.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use learnly_core::command::Command;
use learnly_core::error::DomainError;

/// Handles one command type.
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    /// Executes the command.
    ///
    /// # Errors
    ///
    /// Returns the domain error the command failed with; the bus
    /// propagates it to the caller unchanged.
    async fn handle(&self, command: C) -> Result<(), DomainError>;
}

/// Registry routing commands by their runtime type.
///
/// Exactly one handler per command type. Re-registration overwrites the
/// previous handler and logs a warning; a lookup miss fails with
/// [`DomainError::NoHandlerRegistered`], which indicates a wiring bug and
/// should be caught by a startup check, not at runtime.
#[derive(Default)]
pub struct CommandBus {
    handlers: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl CommandBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for command type `C`, replacing (with a
    /// warning) any handler registered earlier.
    pub fn register<C, H>(&self, handler: H)
    where
        C: Command + 'static,
        H: CommandHandler<C> + 'static,
    {
        let handler: Arc<dyn CommandHandler<C>> = Arc::new(handler);
        let previous = write_lock(&self.handlers).insert(TypeId::of::<C>(), Box::new(handler));
        if previous.is_some() {
            tracing::warn!(
                command = std::any::type_name::<C>(),
                "command handler overwritten"
            );
        }
    }

    /// Dispatches a command to its registered handler, exactly once, with
    /// no retry at this layer.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NoHandlerRegistered`] when no handler is
    /// registered for the command's type; otherwise propagates the
    /// handler's error after logging it.
    pub async fn execute<C: Command + 'static>(&self, command: C) -> Result<(), DomainError> {
        let handler = read_lock(&self.handlers)
            .get(&TypeId::of::<C>())
            .and_then(|boxed| boxed.downcast_ref::<Arc<dyn CommandHandler<C>>>())
            .cloned();

        let Some(handler) = handler else {
            return Err(DomainError::NoHandlerRegistered(
                command.command_type().to_owned(),
            ));
        };

        tracing::debug!(
            command = command.command_type(),
            command_id = %command.command_id(),
            correlation_id = %command.correlation_id(),
            "dispatching command"
        );

        let command_type = command.command_type();
        handler.handle(command).await.inspect_err(|error| {
            tracing::debug!(command = command_type, %error, "command failed");
        })
    }
}

type HandlerMap = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

// A poisoned lock only means a registering thread panicked; the map
// itself is still coherent, so recover the guard instead of propagating.
fn read_lock(lock: &RwLock<HandlerMap>) -> RwLockReadGuard<'_, HandlerMap> {
    lock.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn write_lock(lock: &RwLock<HandlerMap>) -> RwLockWriteGuard<'_, HandlerMap> {
    lock.write()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
