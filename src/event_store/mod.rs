//! Event Store module
//!
//! Persistence layer for Event Sourcing.
//! The `EventStore` trait is the boundary the command handler depends on;
//! `InMemoryEventStore` backs tests and local runs, `PgEventStore` stores
//! streams in PostgreSQL.

mod error;
mod memory;
mod postgres;
mod repository;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::OperationContext;

pub use error::EventStoreError;
pub use memory::InMemoryEventStore;
pub use postgres::PgEventStore;
pub use repository::{load_aggregate, save_aggregate, NewEvent};

/// Stream position the writer expects when appending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedVersion {
    /// The stream must not exist yet
    NoStream,
    /// The stream's last event must have exactly this version
    Exact(i64),
}

impl ExpectedVersion {
    /// Expected version for an aggregate whose last persisted event is `version`
    pub fn from_committed(version: i64) -> Self {
        if version == 0 {
            Self::NoStream
        } else {
            Self::Exact(version)
        }
    }

    /// Whether a stream currently at `current` (0 = absent) satisfies this expectation
    pub fn matches(&self, current: i64) -> bool {
        match self {
            Self::NoStream => current == 0,
            Self::Exact(version) => current == *version,
        }
    }

    /// The version a stream is assumed to be at; 0 for `NoStream`
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::NoStream => 0,
            Self::Exact(version) => *version,
        }
    }
}

impl fmt::Display for ExpectedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoStream => write!(f, "no stream"),
            Self::Exact(version) => write!(f, "{}", version),
        }
    }
}

/// Stored event as read back from the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub version: i64,
    pub event_type: String,
    pub event_data: serde_json::Value,
    pub context: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Append-only event log with optimistic concurrency
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Read a stream in version order. `None` when the stream does not exist.
    async fn load(&self, aggregate_id: Uuid) -> Result<Option<Vec<StoredEvent>>, EventStoreError>;

    /// Append events if the stream is still at `expected`.
    /// Returns the version of the last appended event.
    async fn append(
        &self,
        aggregate_id: Uuid,
        expected: ExpectedVersion,
        events: Vec<NewEvent>,
        context: &OperationContext,
    ) -> Result<i64, EventStoreError>;
}
