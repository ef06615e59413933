//! Account Aggregate
//!
//! Account is the core aggregate for managing balances, limits and blocking.
//! Command methods validate against the current state and raise events;
//! raising applies the event immediately and queues it for persistence.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{AccountEvent, Amount, Balance, DomainError, Limit};

use super::Aggregate;

/// Account Aggregate
///
/// State is derived from events, never directly mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    /// Unique account ID, set by `AccountCreated`
    id: Option<Uuid>,

    /// Account holder name
    name: String,

    /// Cleared funds
    balance: Balance,

    /// How far the balance may go below zero on cash withdrawal
    overdraft_limit: Option<Limit>,

    /// Ceiling for withdrawals + wire transfers per business day
    daily_transfer_limit: Option<Limit>,

    /// Withdrawals + wire transfers since the last rollover
    daily_limit_used: Decimal,

    /// Wire transfers since the last rollover
    current_day_total_transfer: Decimal,

    /// Deposited cheques awaiting the next business day
    pending_amount: Decimal,

    blocked: bool,

    /// Number of events applied
    version: i64,

    /// Raised but not yet persisted
    changes: Vec<AccountEvent>,
}

impl Account {
    /// Open a new account. The returned aggregate holds the pending
    /// `AccountCreated` event.
    pub fn create(account_id: Uuid, name: &str) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidAccountName);
        }

        let mut account = Self::default();
        account.raise(AccountEvent::AccountCreated {
            account_id,
            name: name.to_string(),
        });
        Ok(account)
    }

    pub fn set_overdraft_limit(&mut self, limit: Decimal) -> Result<(), DomainError> {
        let account_id = self.require_id()?;
        let limit = Limit::new(limit)
            .map_err(|_| DomainError::InvalidLimit("The overdraft limit cannot be negative."))?;

        self.raise(AccountEvent::OverdraftLimitSet { account_id, limit });
        Ok(())
    }

    pub fn set_daily_wire_transfer_limit(&mut self, limit: Decimal) -> Result<(), DomainError> {
        let account_id = self.require_id()?;
        let limit = Limit::new(limit).map_err(|_| {
            DomainError::InvalidLimit("The Daily Wire Transfer limit cannot be negative.")
        })?;

        self.raise(AccountEvent::DailyWireTransferLimitSet { account_id, limit });
        Ok(())
    }

    /// Deposit a cheque. Funds stay pending until the next business day and
    /// a blocked account stays blocked.
    pub fn deposit_cheque(&mut self, amount: Decimal) -> Result<(), DomainError> {
        let account_id = self.require_id()?;
        let amount = Amount::new(amount).map_err(|_| {
            DomainError::InvalidAmount("The deposited cheque amount should be greater than 0.")
        })?;
        self.pending_amount
            .checked_add(amount.value())
            .ok_or(DomainError::AmountOverflow)?;

        self.raise(AccountEvent::ChequeDeposited { account_id, amount });
        Ok(())
    }

    /// Deposit cash. Cash is usable at once, so it also lifts a block.
    pub fn deposit_cash(&mut self, amount: Decimal) -> Result<(), DomainError> {
        let account_id = self.require_id()?;
        let amount = Amount::new(amount).map_err(|_| {
            DomainError::InvalidAmount("The deposited cash amount should be greater than 0.")
        })?;
        self.balance
            .checked_credit(amount.value())
            .ok_or(DomainError::AmountOverflow)?;

        self.raise(AccountEvent::CashDeposited { account_id, amount });

        if self.blocked {
            self.raise(AccountEvent::AccountUnblocked { account_id });
        }
        Ok(())
    }

    /// Withdraw cash.
    ///
    /// Without an overdraft a withdrawal above the balance is rejected
    /// outright. With an overdraft, exceeding balance + overdraft (or the
    /// daily allowance) is recorded as `WithdrawalFailed` and blocks the
    /// account.
    pub fn withdraw_cash(&mut self, amount: Decimal) -> Result<(), DomainError> {
        let account_id = self.require_id()?;
        let amount = Amount::new(amount).map_err(|_| {
            DomainError::InvalidAmount("Withdrawn Cash amount should be greater than 0.")
        })?;

        match self.overdraft_limit {
            None => {
                if !self.balance.is_sufficient_for(amount) {
                    return Err(DomainError::insufficient_funds(
                        "cash withdrawal",
                        amount.value(),
                        self.balance.value(),
                    ));
                }
            }
            Some(overdraft) => {
                if !self.balance.is_sufficient_with_overdraft(amount, overdraft) {
                    self.raise(AccountEvent::WithdrawalFailed { account_id, amount });
                    self.raise(AccountEvent::AccountBlocked { account_id });
                    return Ok(());
                }
            }
        }

        if self.exceeds_daily_allowance(amount) {
            self.raise(AccountEvent::WithdrawalFailed { account_id, amount });
            self.raise(AccountEvent::AccountBlocked { account_id });
            return Ok(());
        }

        if self.blocked {
            self.raise(AccountEvent::WithdrawalFailed { account_id, amount });
            return Ok(());
        }

        self.check_spend(amount)?;
        self.raise(AccountEvent::CashWithdrawn { account_id, amount });
        Ok(())
    }

    /// Send a wire transfer. Wire transfers never use the overdraft.
    pub fn try_wire_transfer(&mut self, amount: Decimal) -> Result<(), DomainError> {
        let account_id = self.require_id()?;
        let amount = Amount::new(amount).map_err(|_| {
            DomainError::InvalidAmount("Wire Transfer amount should be greater than 0.")
        })?;

        if !self.balance.is_sufficient_for(amount) {
            return Err(DomainError::insufficient_funds(
                "wire transfer",
                amount.value(),
                self.balance.value(),
            ));
        }

        if self.exceeds_daily_allowance(amount) {
            self.raise(AccountEvent::WireTransferFailed { account_id, amount });
            self.raise(AccountEvent::AccountBlocked { account_id });
            return Ok(());
        }

        if self.blocked {
            self.raise(AccountEvent::WireTransferFailed { account_id, amount });
            return Ok(());
        }

        self.check_spend(amount)?;
        self.current_day_total_transfer
            .checked_add(amount.value())
            .ok_or(DomainError::AmountOverflow)?;
        self.raise(AccountEvent::WireTransferHappened { account_id, amount });
        Ok(())
    }

    /// Roll over to a new business day: release pending cheques, reset the
    /// daily usage and unblock if cheque funds were waiting.
    pub fn start_new_business_day(&mut self) -> Result<(), DomainError> {
        let account_id = self.require_id()?;
        // decided before the rollover clears pending_amount
        let unblock = self.blocked && self.pending_amount > Decimal::ZERO;
        self.balance
            .checked_credit(self.pending_amount)
            .ok_or(DomainError::AmountOverflow)?;

        self.raise(AccountEvent::BusinessDayStarted { account_id });

        if unblock {
            self.raise(AccountEvent::AccountUnblocked { account_id });
        }
        Ok(())
    }

    fn raise(&mut self, event: AccountEvent) {
        self.apply(&event);
        self.changes.push(event);
    }

    fn require_id(&self) -> Result<Uuid, DomainError> {
        self.id.ok_or(DomainError::AccountNotCreated)
    }

    /// Reject a debit whose balance or daily usage would leave the Decimal range
    fn check_spend(&self, amount: Amount) -> Result<(), DomainError> {
        self.balance
            .checked_debit(amount.value())
            .ok_or(DomainError::AmountOverflow)?;
        self.daily_limit_used
            .checked_add(amount.value())
            .ok_or(DomainError::AmountOverflow)?;
        Ok(())
    }

    fn exceeds_daily_allowance(&self, amount: Amount) -> bool {
        self.daily_transfer_limit
            .is_some_and(|limit| limit.remaining(self.daily_limit_used) < amount.value())
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub fn overdraft_limit(&self) -> Option<Limit> {
        self.overdraft_limit
    }

    pub fn daily_transfer_limit(&self) -> Option<Limit> {
        self.daily_transfer_limit
    }

    pub fn daily_limit_used(&self) -> Decimal {
        self.daily_limit_used
    }

    pub fn current_day_total_transfer(&self) -> Decimal {
        self.current_day_total_transfer
    }

    pub fn pending_amount(&self) -> Decimal {
        self.pending_amount
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }
}

impl Aggregate for Account {
    type Event = AccountEvent;

    fn aggregate_type() -> &'static str {
        "Account"
    }

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AccountEvent::AccountCreated { account_id, name } => {
                self.id = Some(*account_id);
                self.name = name.clone();
            }

            AccountEvent::OverdraftLimitSet { limit, .. } => {
                self.overdraft_limit = Some(*limit);
            }

            AccountEvent::DailyWireTransferLimitSet { limit, .. } => {
                self.daily_transfer_limit = Some(*limit);
            }

            AccountEvent::CashDeposited { amount, .. } => {
                self.balance = self.balance.credit(amount.value());
            }

            AccountEvent::ChequeDeposited { amount, .. } => {
                self.pending_amount = self.pending_amount.saturating_add(amount.value());
            }

            AccountEvent::CashWithdrawn { amount, .. } => {
                self.balance = self.balance.debit(amount.value());
                self.daily_limit_used = self.daily_limit_used.saturating_add(amount.value());
            }

            AccountEvent::WireTransferHappened { amount, .. } => {
                self.balance = self.balance.debit(amount.value());
                self.daily_limit_used = self.daily_limit_used.saturating_add(amount.value());
                self.current_day_total_transfer =
                    self.current_day_total_transfer.saturating_add(amount.value());
            }

            AccountEvent::WithdrawalFailed { .. }
            | AccountEvent::WireTransferFailed { .. }
            | AccountEvent::AccountBlocked { .. } => {
                self.blocked = true;
            }

            AccountEvent::AccountUnblocked { .. } => {
                self.blocked = false;
            }

            AccountEvent::BusinessDayStarted { .. } => {
                self.balance = self.balance.credit(self.pending_amount);
                self.pending_amount = Decimal::ZERO;
                self.daily_limit_used = Decimal::ZERO;
                self.current_day_total_transfer = Decimal::ZERO;
            }
        }

        self.version += 1;
    }

    fn pending_changes(&self) -> &[Self::Event] {
        &self.changes
    }

    fn take_changes(&mut self) -> Vec<Self::Event> {
        std::mem::take(&mut self.changes)
    }
}
