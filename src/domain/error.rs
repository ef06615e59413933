//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Rejections raised by the account aggregate and its command handler.
///
/// A rejection never produces an event. Business exhaustion (an overdraft or
/// daily limit being hit) is not an error: it is recorded as failure and
/// blocking events instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Account name is empty or whitespace
    #[error("The account name is invalid.")]
    InvalidAccountName,

    /// Non-positive amount for a deposit, withdrawal or transfer
    #[error("{0}")]
    InvalidAmount(&'static str),

    /// Negative overdraft or daily limit
    #[error("{0}")]
    InvalidLimit(&'static str),

    /// Hard funds check failed (no overdraft configured, or a wire transfer)
    #[error("The account does not have enough funds for requested {operation}.")]
    InsufficientFunds {
        operation: &'static str,
        requested: Decimal,
        available: Decimal,
    },

    /// Command targets an account that has no event stream
    #[error("{reason}")]
    AccountNotFound { account_id: Uuid, reason: &'static str },

    /// Creation requested for an id that already has a stream
    #[error("The account with specified ID already exists.")]
    AccountAlreadyExists(Uuid),

    /// Aggregate method invoked before the creation event was applied
    #[error("The account has not been created.")]
    AccountNotCreated,

    /// Balance, pending amount or a daily counter would leave the Decimal range
    #[error("The amount exceeds what the account can hold.")]
    AmountOverflow,
}

impl DomainError {
    /// Create an insufficient funds error
    pub fn insufficient_funds(operation: &'static str, requested: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds {
            operation,
            requested,
            available,
        }
    }

    /// Create a not-found error naming the rejected operation
    pub fn account_not_found(account_id: Uuid, reason: &'static str) -> Self {
        Self::AccountNotFound { account_id, reason }
    }

    /// Check if this is a client error (bad input rather than missing state)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAccountName
                | Self::InvalidAmount(_)
                | Self::InvalidLimit(_)
                | Self::InsufficientFunds { .. }
                | Self::AmountOverflow
        )
    }
}
