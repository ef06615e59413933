//! Aggregate Repository
//!
//! Maps between an aggregate's typed events and the store's serialized
//! records: replay on load, optimistic append on save.

use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::domain::{DomainEvent, OperationContext};

use super::{EventStore, EventStoreError, ExpectedVersion};

/// Serialized event waiting to be appended
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub aggregate_type: String,
    pub event_type: String,
    pub event_data: serde_json::Value,
}

impl NewEvent {
    /// Serialize a domain event for storage
    pub fn new<E: Serialize>(
        aggregate_type: &str,
        event_type: &str,
        event: &E,
    ) -> Result<Self, EventStoreError> {
        let event_data = serde_json::to_value(event)?;
        Ok(Self {
            aggregate_type: aggregate_type.to_string(),
            event_type: event_type.to_string(),
            event_data,
        })
    }
}

/// Load an aggregate by replaying its stream. `None` if the stream is absent.
pub async fn load_aggregate<A, S>(
    store: &S,
    aggregate_id: Uuid,
) -> Result<Option<A>, EventStoreError>
where
    A: Aggregate,
    S: EventStore + ?Sized,
{
    let Some(stored_events) = store.load(aggregate_id).await? else {
        return Ok(None);
    };

    let mut events = Vec::with_capacity(stored_events.len());
    for stored_event in stored_events {
        if stored_event.aggregate_type != A::aggregate_type() {
            return Err(EventStoreError::InvalidEventData(format!(
                "stream {} holds {} events, expected {}",
                aggregate_id,
                stored_event.aggregate_type,
                A::aggregate_type()
            )));
        }
        let event: A::Event = serde_json::from_value(stored_event.event_data)?;
        events.push(event);
    }

    let aggregate = A::from_history(events);
    tracing::debug!(
        aggregate_type = A::aggregate_type(),
        %aggregate_id,
        version = aggregate.version(),
        "Aggregate replayed"
    );
    Ok(Some(aggregate))
}

/// Persist the aggregate's pending events, expecting the stream to still be
/// at the aggregate's committed version.
///
/// On success the pending events are drained and returned together with the
/// new stream version. On failure the aggregate is left untouched.
pub async fn save_aggregate<A, S>(
    store: &S,
    aggregate: &mut A,
    context: &OperationContext,
) -> Result<(i64, Vec<A::Event>), EventStoreError>
where
    A: Aggregate,
    S: EventStore + ?Sized,
{
    let expected = ExpectedVersion::from_committed(aggregate.committed_version());

    if aggregate.pending_changes().is_empty() {
        return Ok((expected.as_i64(), Vec::new()));
    }

    let aggregate_id = aggregate.id().ok_or_else(|| {
        EventStoreError::InvalidEventData(format!(
            "{} aggregate has no id; it was never created",
            A::aggregate_type()
        ))
    })?;

    let new_events = aggregate
        .pending_changes()
        .iter()
        .map(|event| NewEvent::new(A::aggregate_type(), event.event_type(), event))
        .collect::<Result<Vec<_>, _>>()?;

    let version = store
        .append(aggregate_id, expected, new_events, context)
        .await?;

    Ok((version, aggregate.take_changes()))
}
