//! Event bus — fans committed events out to subscribed projections.
//!
//! Publication is post-commit: by the time `publish` runs, the events are
//! already durable, so a failing subscriber must never fail the
//! originating command. Each handler failure is caught and logged;
//! delivery is at-least-once from the subscriber's perspective, so
//! handlers must be idempotent.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use thiserror::Error;

use learnly_core::event_store::StoredEvent;
use learnly_core::publisher::EventPublisher;

/// Error a projection handler failed with. Caught and logged inside
/// [`EventBus::publish`]; never propagated to the command path.
#[derive(Debug, Error)]
#[error("projection handler error: {0}")]
pub struct ProjectionError(pub String);

/// Consumes published events to update a read model.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable name for diagnostics.
    fn name(&self) -> &'static str;

    /// Applies one event to the handler's read model. Must be idempotent:
    /// applying the same event twice must leave the model unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError`] on failure; the bus logs it and
    /// continues with the remaining handlers.
    async fn handle(&self, event: &StoredEvent) -> Result<(), ProjectionError>;
}

/// Registry fanning events out by event type.
///
/// Multiple handlers may subscribe to the same type; all are invoked
/// concurrently for each published event.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a handler to every future published event of
    /// `event_type`.
    pub fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        tracing::debug!(event_type, handler = handler.name(), "subscribing handler");
        write_lock(&self.subscribers)
            .entry(event_type.to_owned())
            .or_default()
            .push(handler);
    }

    fn handlers_for(&self, event_type: &str) -> Vec<Arc<dyn EventHandler>> {
        read_lock(&self.subscribers)
            .get(event_type)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, events: &[StoredEvent]) {
        for event in events {
            let handlers = self.handlers_for(&event.event_type);
            if handlers.is_empty() {
                continue;
            }

            let tasks: Vec<_> = handlers
                .into_iter()
                .map(|handler| {
                    let event = event.clone();
                    tokio::spawn(async move {
                        let name = handler.name();
                        if let Err(error) = handler.handle(&event).await {
                            tracing::error!(
                                handler = name,
                                event_type = %event.event_type,
                                event_id = %event.event_id,
                                %error,
                                "projection handler failed"
                            );
                        }
                    })
                })
                .collect();

            for task in tasks {
                if let Err(error) = task.await {
                    tracing::error!(%error, "projection handler panicked");
                }
            }
        }
    }
}

type SubscriberMap = HashMap<String, Vec<Arc<dyn EventHandler>>>;

fn read_lock(lock: &RwLock<SubscriberMap>) -> RwLockReadGuard<'_, SubscriberMap> {
    lock.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn write_lock(lock: &RwLock<SubscriberMap>) -> RwLockWriteGuard<'_, SubscriberMap> {
    lock.write()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn make_stored_event(event_type: &str) -> StoredEvent {
        StoredEvent {
            event_id: Uuid::new_v4(),
            aggregate_id: Uuid::new_v4(),
            event_type: event_type.to_owned(),
            payload: serde_json::json!({}),
            event_version: 1,
            correlation_id: Uuid::new_v4(),
            causation_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        }
    }

    #[derive(Default)]
    struct CountingHandler {
        seen: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn handle(&self, event: &StoredEvent) -> Result<(), ProjectionError> {
            self.seen.lock().unwrap().push(event.event_id);
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl EventHandler for FailingHandler {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn handle(&self, _event: &StoredEvent) -> Result<(), ProjectionError> {
            Err(ProjectionError("read model unavailable".to_owned()))
        }
    }

    struct PanickingHandler;

    #[async_trait]
    impl EventHandler for PanickingHandler {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn handle(&self, _event: &StoredEvent) -> Result<(), ProjectionError> {
            panic!("boom");
        }
    }

    #[tokio::test]
    async fn test_publish_invokes_all_subscribers_for_the_type() {
        // Arrange
        let bus = EventBus::new();
        let first = Arc::new(CountingHandler::default());
        let second = Arc::new(CountingHandler::default());
        bus.subscribe("lesson.completed", Arc::clone(&first) as Arc<dyn EventHandler>);
        bus.subscribe(
            "lesson.completed",
            Arc::clone(&second) as Arc<dyn EventHandler>,
        );
        let event = make_stored_event("lesson.completed");

        // Act
        bus.publish(std::slice::from_ref(&event)).await;

        // Assert
        assert_eq!(*first.seen.lock().unwrap(), vec![event.event_id]);
        assert_eq!(*second.seen.lock().unwrap(), vec![event.event_id]);
    }

    #[tokio::test]
    async fn test_publish_skips_handlers_of_other_types() {
        // Arrange
        let bus = EventBus::new();
        let handler = Arc::new(CountingHandler::default());
        bus.subscribe("lesson.completed", Arc::clone(&handler) as Arc<dyn EventHandler>);

        // Act
        bus.publish(&[make_stored_event("lesson.started")]).await;

        // Assert
        assert!(handler.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failing_subscriber_does_not_block_others_or_fail_publish() {
        // Arrange
        let bus = EventBus::new();
        let healthy = Arc::new(CountingHandler::default());
        bus.subscribe("quiz.attempt_completed", Arc::new(FailingHandler));
        bus.subscribe(
            "quiz.attempt_completed",
            Arc::clone(&healthy) as Arc<dyn EventHandler>,
        );
        let event = make_stored_event("quiz.attempt_completed");

        // Act: resolves despite the failing subscriber.
        bus.publish(std::slice::from_ref(&event)).await;

        // Assert
        assert_eq!(*healthy.seen.lock().unwrap(), vec![event.event_id]);
    }

    #[tokio::test]
    async fn test_panicking_subscriber_is_isolated() {
        // Arrange
        let bus = EventBus::new();
        let healthy = Arc::new(CountingHandler::default());
        bus.subscribe("quiz.attempt_completed", Arc::new(PanickingHandler));
        bus.subscribe(
            "quiz.attempt_completed",
            Arc::clone(&healthy) as Arc<dyn EventHandler>,
        );
        let event = make_stored_event("quiz.attempt_completed");

        // Act
        bus.publish(std::slice::from_ref(&event)).await;

        // Assert
        assert_eq!(*healthy.seen.lock().unwrap(), vec![event.event_id]);
    }

    #[tokio::test]
    async fn test_publish_delivers_events_in_order_to_one_handler() {
        // Arrange
        let bus = EventBus::new();
        let handler = Arc::new(CountingHandler::default());
        bus.subscribe("lesson.completed", Arc::clone(&handler) as Arc<dyn EventHandler>);
        let first = make_stored_event("lesson.completed");
        let second = make_stored_event("lesson.completed");

        // Act
        bus.publish(&[first.clone(), second.clone()]).await;

        // Assert
        assert_eq!(
            *handler.seen.lock().unwrap(),
            vec![first.event_id, second.event_id]
        );
    }
}
