//! In-memory Event Store
//!
//! Keeps every stream in a map behind an async RwLock. The version check and
//! the append happen under the same write guard, so two writers racing on one
//! stream cannot both succeed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::OperationContext;

use super::{EventStore, EventStoreError, ExpectedVersion, NewEvent, StoredEvent};

/// Event store for tests and local development
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<RwLock<HashMap<Uuid, Vec<StoredEvent>>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events in a stream (0 when absent)
    pub async fn stream_version(&self, aggregate_id: Uuid) -> i64 {
        self.streams
            .read()
            .await
            .get(&aggregate_id)
            .map_or(0, |events| events.len() as i64)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn load(&self, aggregate_id: Uuid) -> Result<Option<Vec<StoredEvent>>, EventStoreError> {
        Ok(self.streams.read().await.get(&aggregate_id).cloned())
    }

    async fn append(
        &self,
        aggregate_id: Uuid,
        expected: ExpectedVersion,
        events: Vec<NewEvent>,
        context: &OperationContext,
    ) -> Result<i64, EventStoreError> {
        let context_json = serde_json::to_value(context)?;
        let mut streams = self.streams.write().await;

        let current_version = streams
            .get(&aggregate_id)
            .map_or(0, |events| events.len() as i64);

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

        if events.is_empty() {
            return Ok(current_version);
        }

        let stream = streams.entry(aggregate_id).or_default();
        let created_at = Utc::now();
        for event in events {
            let version = stream.len() as i64 + 1;
            stream.push(StoredEvent {
                id: Uuid::new_v4(),
                aggregate_type: event.aggregate_type,
                aggregate_id,
                version,
                event_type: event.event_type,
                event_data: event.event_data,
                context: context_json.clone(),
                created_at,
            });
        }

        Ok(stream.len() as i64)
    }
}
