//! Domain Events
//!
//! Event definitions for Event Sourcing.
//! Events are immutable facts that have happened to an account.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, Limit};

/// Behaviour every event type needs to travel through the event store.
pub trait DomainEvent: Clone + Serialize + DeserializeOwned + Send + Sync {
    /// Stable name stored alongside the payload
    fn event_type(&self) -> &'static str;
}

/// Account-related events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AccountEvent {
    /// Account was opened
    AccountCreated { account_id: Uuid, name: String },

    /// Overdraft ceiling was configured
    OverdraftLimitSet { account_id: Uuid, limit: Limit },

    /// Daily wire transfer ceiling was configured
    DailyWireTransferLimitSet { account_id: Uuid, limit: Limit },

    /// Cash was deposited (available immediately)
    CashDeposited { account_id: Uuid, amount: Amount },

    /// Cheque was deposited (pending until the next business day)
    ChequeDeposited { account_id: Uuid, amount: Amount },

    /// Cash was withdrawn
    CashWithdrawn { account_id: Uuid, amount: Amount },

    /// Cash withdrawal was refused
    WithdrawalFailed { account_id: Uuid, amount: Amount },

    /// Wire transfer went out
    WireTransferHappened { account_id: Uuid, amount: Amount },

    /// Wire transfer was refused
    WireTransferFailed { account_id: Uuid, amount: Amount },

    /// Account was blocked for withdrawals and transfers
    AccountBlocked { account_id: Uuid },

    /// Account was unblocked
    AccountUnblocked { account_id: Uuid },

    /// Day rollover: pending cheques cleared, daily usage reset
    BusinessDayStarted { account_id: Uuid },
}

impl AccountEvent {
    /// Get the account ID this event relates to
    pub fn account_id(&self) -> Uuid {
        match self {
            AccountEvent::AccountCreated { account_id, .. }
            | AccountEvent::OverdraftLimitSet { account_id, .. }
            | AccountEvent::DailyWireTransferLimitSet { account_id, .. }
            | AccountEvent::CashDeposited { account_id, .. }
            | AccountEvent::ChequeDeposited { account_id, .. }
            | AccountEvent::CashWithdrawn { account_id, .. }
            | AccountEvent::WithdrawalFailed { account_id, .. }
            | AccountEvent::WireTransferHappened { account_id, .. }
            | AccountEvent::WireTransferFailed { account_id, .. }
            | AccountEvent::AccountBlocked { account_id }
            | AccountEvent::AccountUnblocked { account_id }
            | AccountEvent::BusinessDayStarted { account_id } => *account_id,
        }
    }

    /// True for the events that record a refused withdrawal or transfer
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            AccountEvent::WithdrawalFailed { .. } | AccountEvent::WireTransferFailed { .. }
        )
    }
}

impl DomainEvent for AccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::AccountCreated { .. } => "AccountCreated",
            AccountEvent::OverdraftLimitSet { .. } => "OverdraftLimitSet",
            AccountEvent::DailyWireTransferLimitSet { .. } => "DailyWireTransferLimitSet",
            AccountEvent::CashDeposited { .. } => "CashDeposited",
            AccountEvent::ChequeDeposited { .. } => "ChequeDeposited",
            AccountEvent::CashWithdrawn { .. } => "CashWithdrawn",
            AccountEvent::WithdrawalFailed { .. } => "WithdrawalFailed",
            AccountEvent::WireTransferHappened { .. } => "WireTransferHappened",
            AccountEvent::WireTransferFailed { .. } => "WireTransferFailed",
            AccountEvent::AccountBlocked { .. } => "AccountBlocked",
            AccountEvent::AccountUnblocked { .. } => "AccountUnblocked",
            AccountEvent::BusinessDayStarted { .. } => "BusinessDayStarted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_account_event_serialization() {
        let event = AccountEvent::CashDeposited {
            account_id: Uuid::new_v4(),
            amount: Amount::new(dec!(100)).unwrap(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"CashDeposited""#));

        let deserialized: AccountEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_event_type_matches_serde_tag() {
        let event = AccountEvent::BusinessDayStarted {
            account_id: Uuid::new_v4(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], event.event_type());
    }

    #[test]
    fn test_corrupt_amount_is_rejected_on_read() {
        let json = format!(
            r#"{{"type":"CashWithdrawn","account_id":"{}","amount":"-5"}}"#,
            Uuid::new_v4()
        );
        assert!(serde_json::from_str::<AccountEvent>(&json).is_err());
    }

    #[test]
    fn test_is_failure() {
        let id = Uuid::new_v4();
        let amount = Amount::new(dec!(1)).unwrap();

        assert!(AccountEvent::WithdrawalFailed { account_id: id, amount }.is_failure());
        assert!(AccountEvent::WireTransferFailed { account_id: id, amount }.is_failure());
        assert!(!AccountEvent::CashWithdrawn { account_id: id, amount }.is_failure());
        assert!(!AccountEvent::AccountBlocked { account_id: id }.is_failure());
    }
}
