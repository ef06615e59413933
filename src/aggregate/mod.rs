//! Aggregate module
//!
//! Aggregate Root pattern implementation for Event Sourcing.

pub mod account;

pub use account::Account;

use uuid::Uuid;

use crate::domain::DomainEvent;

/// Aggregate trait that all aggregates must implement
pub trait Aggregate: Sized + Default {
    /// The type of events this aggregate handles
    type Event: DomainEvent;

    /// Get the aggregate type name (for storage)
    fn aggregate_type() -> &'static str;

    /// Get the aggregate ID, if the creation event has been applied
    fn id(&self) -> Option<Uuid>;

    /// Get the current version (number of events applied)
    fn version(&self) -> i64;

    /// Apply an event to update the aggregate state
    fn apply(&mut self, event: &Self::Event);

    /// Events raised since the aggregate was loaded, not yet persisted
    fn pending_changes(&self) -> &[Self::Event];

    /// Drain the raised events for persistence
    fn take_changes(&mut self) -> Vec<Self::Event>;

    /// Version of the last persisted event; the expected version on append
    fn committed_version(&self) -> i64 {
        self.version() - self.pending_changes().len() as i64
    }

    /// Rebuild an aggregate by replaying its history in order
    fn from_history<I>(events: I) -> Self
    where
        I: IntoIterator<Item = Self::Event>,
    {
        let mut aggregate = Self::default();
        for event in events {
            aggregate.apply(&event);
        }
        aggregate
    }
}
