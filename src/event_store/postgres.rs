//! PostgreSQL Event Store
//!
//! Streams live in the `events` table, one row per event, unique on
//! `(aggregate_id, version)`. Appends run in a transaction that re-reads the
//! stream head before inserting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::domain::OperationContext;

use super::{EventStore, EventStoreError, ExpectedVersion, NewEvent, StoredEvent};

type EventRow = (
    Uuid,
    String,
    Uuid,
    i64,
    String,
    serde_json::Value,
    serde_json::Value,
    DateTime<Utc>,
);

/// Event Store for persisting and retrieving events
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Create a new PgEventStore with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get current version of an aggregate (0 when the stream is absent)
    async fn get_current_version<'e, E>(
        executor: E,
        aggregate_id: Uuid,
    ) -> Result<i64, EventStoreError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MAX(version) FROM events WHERE aggregate_id = $1
            "#,
        )
        .bind(aggregate_id)
        .fetch_optional(executor)
        .await?
        .flatten();

        Ok(result.unwrap_or(0))
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn load(&self, aggregate_id: Uuid) -> Result<Option<Vec<StoredEvent>>, EventStoreError> {
        let events: Vec<StoredEvent> = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, aggregate_type, aggregate_id, version, event_type, event_data, context, created_at
            FROM events
            WHERE aggregate_id = $1
            ORDER BY version ASC
            "#,
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(
            |(id, aggregate_type, aggregate_id, version, event_type, event_data, context, created_at)| {
                StoredEvent {
                    id,
                    aggregate_type,
                    aggregate_id,
                    version,
                    event_type,
                    event_data,
                    context,
                    created_at,
                }
            },
        )
        .collect();

        if events.is_empty() {
            return Ok(None);
        }
        Ok(Some(events))
    }

    async fn append(
        &self,
        aggregate_id: Uuid,
        expected: ExpectedVersion,
        events: Vec<NewEvent>,
        context: &OperationContext,
    ) -> Result<i64, EventStoreError> {
        let context_json = serde_json::to_value(context)?;

        let mut tx = self.pool.begin().await?;

        let current_version = Self::get_current_version(&mut *tx, aggregate_id).await?;
        if !expected.matches(current_version) {
            tracing::warn!(
                %aggregate_id,
                expected = %expected,
                actual = current_version,
                "Append rejected: stream moved since load"
            );
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        let mut version = current_version;
        for event in events {
            version += 1;

            let inserted = sqlx::query(
                r#"
                INSERT INTO events (
                    aggregate_type, aggregate_id, version,
                    event_type, event_data, context
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&event.aggregate_type)
            .bind(aggregate_id)
            .bind(version)
            .bind(&event.event_type)
            .bind(&event.event_data)
            .bind(&context_json)
            .execute(&mut *tx)
            .await;

            // A concurrent writer committed the same version between our read
            // and our insert. The transaction is aborted, so the winner's head
            // is read from the pool.
            if let Err(sqlx::Error::Database(db_err)) = &inserted {
                if db_err.is_unique_violation() {
                    tx.rollback().await?;
                    let actual = Self::get_current_version(&self.pool, aggregate_id).await?;
                    tracing::warn!(
                        %aggregate_id,
                        expected = %expected,
                        actual,
                        "Append lost a race with a concurrent writer"
                    );
                    return Err(EventStoreError::ConcurrencyConflict {
                        aggregate_id,
                        expected,
                        actual,
                    });
                }
            }
            inserted?;
        }

        tx.commit().await?;

        Ok(version)
    }
}
