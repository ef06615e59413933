//! Operation Context
//!
//! Causal metadata about the current command, stored with every event it
//! produces.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for an operation, used for causation tracking and tracing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationContext {
    /// Id of the command that caused the events (causation id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_id: Option<Uuid>,

    /// Correlation ID shared by every message in one conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl OperationContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self {
            command_id: None,
            correlation_id: None,
        }
    }

    /// Create context with the causing command's id
    pub fn with_command_id(mut self, command_id: Uuid) -> Self {
        self.command_id = Some(command_id);
        self
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Generate a new correlation ID if not present
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }

    /// Generate a new command ID if not present
    pub fn ensure_command_id(&mut self) -> Uuid {
        *self.command_id.get_or_insert_with(Uuid::new_v4)
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}
