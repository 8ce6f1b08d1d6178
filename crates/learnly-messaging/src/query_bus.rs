//! Query bus — routes each query to exactly one registered handler.
//!
//! Identical routing to the command bus, but handlers return a value and
//! must not produce events: query handlers are wired with read-only
//! access to the store, never with a repository that can append.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use learnly_core::error::DomainError;
use learnly_core::query::Query;

/// Handles one query type.
#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync {
    /// Executes the query and returns its result.
    ///
    /// # Errors
    ///
    /// Returns the domain error the query failed with; the bus propagates
    /// it to the caller unchanged.
    async fn handle(&self, query: Q) -> Result<Q::Output, DomainError>;
}

/// Registry routing queries by their runtime type.
#[derive(Default)]
pub struct QueryBus {
    handlers: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl QueryBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for query type `Q`, replacing (with a
    /// warning) any handler registered earlier.
    pub fn register<Q, H>(&self, handler: H)
    where
        Q: Query + 'static,
        H: QueryHandler<Q> + 'static,
    {
        let handler: Arc<dyn QueryHandler<Q>> = Arc::new(handler);
        let previous = write_lock(&self.handlers).insert(TypeId::of::<Q>(), Box::new(handler));
        if previous.is_some() {
            tracing::warn!(query = std::any::type_name::<Q>(), "query handler overwritten");
        }
    }

    /// Dispatches a query to its registered handler.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NoHandlerRegistered`] when no handler is
    /// registered for the query's type; otherwise propagates the
    /// handler's error.
    pub async fn execute<Q: Query + 'static>(&self, query: Q) -> Result<Q::Output, DomainError> {
        let handler = read_lock(&self.handlers)
            .get(&TypeId::of::<Q>())
            .and_then(|boxed| boxed.downcast_ref::<Arc<dyn QueryHandler<Q>>>())
            .cloned();

        let Some(handler) = handler else {
            return Err(DomainError::NoHandlerRegistered(
                query.query_type().to_owned(),
            ));
        };

        tracing::debug!(query = query.query_type(), "dispatching query");
        handler.handle(query).await
    }
}

type HandlerMap = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

fn read_lock(lock: &RwLock<HandlerMap>) -> RwLockReadGuard<'_, HandlerMap> {
    lock.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn write_lock(lock: &RwLock<HandlerMap>) -> RwLockWriteGuard<'_, HandlerMap> {
    lock.write()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct CountAnswers;

    impl Query for CountAnswers {
        type Output = usize;

        fn query_type(&self) -> &'static str {
            "answers.count"
        }
    }

    struct FixedCount(usize);

    #[async_trait]
    impl QueryHandler<CountAnswers> for FixedCount {
        async fn handle(&self, _query: CountAnswers) -> Result<usize, DomainError> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn test_execute_returns_handler_result() {
        // Arrange
        let bus = QueryBus::new();
        bus.register(FixedCount(7));

        // Act
        let count = bus.execute(CountAnswers).await.unwrap();

        // Assert
        assert_eq!(count, 7);
    }

    #[tokio::test]
    async fn test_execute_fails_when_no_handler_registered() {
        // Arrange
        let bus = QueryBus::new();

        // Act
        let result = bus.execute(CountAnswers).await;

        // Assert
        match result.unwrap_err() {
            DomainError::NoHandlerRegistered(query_type) => {
                assert_eq!(query_type, "answers.count");
            }
            other => panic!("expected NoHandlerRegistered, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_re_registration_overwrites_previous_handler() {
        // Arrange
        let bus = QueryBus::new();
        bus.register(FixedCount(1));
        bus.register(FixedCount(2));

        // Act
        let count = bus.execute(CountAnswers).await.unwrap();

        // Assert
        assert_eq!(count, 2);
    }
}
