//! `PostgreSQL` implementation of the `EventStore` trait.
//!
//! `append_events` is the sole concurrency-control gate for the write
//! path: inside one transaction it locks and re-reads the stream head,
//! rejects stale writers with `ConcurrencyConflict`, and inserts the
//! batch all-or-nothing. The unique `(aggregate_id, event_version)`
//! constraint backstops the race where two writers append to a stream
//! that has no head row to lock yet.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use learnly_core::error::DomainError;
use learnly_core::event_store::{EventStore, StoredEvent};

const SELECT_COLUMNS: &str = "SELECT event_id, aggregate_id, event_type, payload, \
     event_version, correlation_id, causation_id, occurred_at FROM domain_events";

/// PostgreSQL-backed event store.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn stream_head(&self, aggregate_id: Uuid) -> Result<i64, DomainError> {
        let head: Option<i64> = sqlx::query_scalar(
            "SELECT event_version FROM domain_events \
             WHERE aggregate_id = $1 ORDER BY event_version DESC LIMIT 1",
        )
        .bind(aggregate_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(head.unwrap_or(0))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    event_id: Uuid,
    aggregate_id: Uuid,
    event_type: String,
    payload: serde_json::Value,
    event_version: i64,
    correlation_id: Uuid,
    causation_id: Uuid,
    occurred_at: DateTime<Utc>,
}

impl From<EventRow> for StoredEvent {
    fn from(row: EventRow) -> Self {
        Self {
            event_id: row.event_id,
            aggregate_id: row.aggregate_id,
            event_type: row.event_type,
            payload: row.payload,
            event_version: row.event_version,
            correlation_id: row.correlation_id,
            causation_id: row.causation_id,
            occurred_at: row.occurred_at,
        }
    }
}

fn infrastructure(error: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(error.to_string())
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        self.load_events_from(aggregate_id, 0).await
    }

    async fn load_events_from(
        &self,
        aggregate_id: Uuid,
        from_version: i64,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE aggregate_id = $1 AND event_version > $2 \
             ORDER BY event_version ASC"
        );
        let rows: Vec<EventRow> = sqlx::query_as(&sql)
            .bind(aggregate_id)
            .bind(from_version)
            .fetch_all(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(rows.into_iter().map(StoredEvent::from).collect())
    }

    async fn load_all_events(&self, from_position: i64) -> Result<Vec<StoredEvent>, DomainError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY global_position ASC OFFSET $1");
        let rows: Vec<EventRow> = sqlx::query_as(&sql)
            .bind(from_position)
            .fetch_all(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(rows.into_iter().map(StoredEvent::from).collect())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(infrastructure)?;

        let head: Option<i64> = sqlx::query_scalar(
            "SELECT event_version FROM domain_events \
             WHERE aggregate_id = $1 ORDER BY event_version DESC LIMIT 1 FOR UPDATE",
        )
        .bind(aggregate_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(infrastructure)?;

        let actual = head.unwrap_or(0);
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        for (i, event) in events.iter().enumerate() {
            #[allow(clippy::cast_possible_wrap)]
            let event_version = expected_version + i as i64 + 1;
            let insert = sqlx::query(
                "INSERT INTO domain_events \
                 (event_id, aggregate_id, event_type, payload, event_version, \
                  correlation_id, causation_id, occurred_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(event.event_id)
            .bind(aggregate_id)
            .bind(&event.event_type)
            .bind(&event.payload)
            .bind(event_version)
            .bind(event.correlation_id)
            .bind(event.causation_id)
            .bind(event.occurred_at)
            .execute(&mut *tx)
            .await;

            if let Err(error) = insert {
                if is_unique_violation(&error) {
                    // Two writers raced on an empty stream; the transaction
                    // rolls back on drop, so the accurate head is readable
                    // from the pool.
                    drop(tx);
                    let actual = self.stream_head(aggregate_id).await?;
                    return Err(DomainError::ConcurrencyConflict {
                        aggregate_id,
                        expected: expected_version,
                        actual,
                    });
                }
                return Err(infrastructure(error));
            }
        }

        tx.commit().await.map_err(infrastructure)?;

        tracing::debug!(
            %aggregate_id,
            appended = events.len(),
            expected_version,
            "events appended"
        );
        Ok(())
    }
}
