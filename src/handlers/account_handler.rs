//! Account Handler
//!
//! Runs one account command end to end: replay the account, invoke the
//! aggregate, append the raised events with the version seen at load.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::aggregate::Account;
use crate::bus::{CommandBus, CommandHandler, Subscription};
use crate::domain::{DomainError, OperationContext};
use crate::error::{AppError, AppResult};
use crate::event_store::{load_aggregate, save_aggregate, EventStore};

use super::{AccountCommand, CommandKind, CommandOutcome, CommandResponse};

/// Handler for every account command
pub struct AccountCommandHandler {
    store: Arc<dyn EventStore>,
}

impl AccountCommandHandler {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Subscribe this handler on the bus for every account command kind.
    /// The routes live as long as the returned subscriptions.
    pub fn subscribe(self: Arc<Self>, bus: &CommandBus) -> AppResult<Vec<Subscription>> {
        CommandKind::ALL
            .iter()
            .map(|kind| bus.subscribe(*kind, self.clone() as Arc<dyn CommandHandler>))
            .collect()
    }

    /// Execute a command against the event store
    pub async fn execute(
        &self,
        command: AccountCommand,
        context: &OperationContext,
    ) -> CommandResponse {
        let account_id = command.account_id();
        let kind = command.kind();

        let loaded = load_aggregate::<Account, _>(self.store.as_ref(), account_id).await?;
        tracing::debug!(
            command = %kind,
            %account_id,
            found = loaded.is_some(),
            "Account loaded"
        );

        let executed = match loaded {
            Some(mut account) => apply_command(&mut account, command).map(|_| account),
            None => open_account(account_id, command),
        };

        let mut account = executed.map_err(|e| {
            tracing::warn!(command = %kind, %account_id, error = %e, "Command rejected");
            AppError::from(e)
        })?;

        let (version, events) = save_aggregate(self.store.as_ref(), &mut account, context)
            .await
            .map_err(|e| {
                if e.is_concurrency_conflict() {
                    tracing::warn!(command = %kind, %account_id, error = %e, "Command lost a version race");
                }
                AppError::from(e)
            })?;

        let outcome = CommandOutcome {
            account_id,
            events,
            version,
        };

        if outcome.is_business_failure() {
            tracing::warn!(
                command = %kind,
                %account_id,
                version,
                blocked = account.is_blocked(),
                "Command refused by account rules"
            );
        } else {
            tracing::info!(
                command = %kind,
                %account_id,
                version,
                events = outcome.events.len(),
                "Command committed"
            );
        }

        Ok(outcome)
    }
}

#[async_trait]
impl CommandHandler for AccountCommandHandler {
    async fn handle(&self, command: AccountCommand, context: OperationContext) -> CommandResponse {
        self.execute(command, &context).await
    }
}

/// Invoke the command on an account that already exists
fn apply_command(account: &mut Account, command: AccountCommand) -> Result<(), DomainError> {
    match command {
        AccountCommand::CreateAccount(c) => Err(DomainError::AccountAlreadyExists(c.account_id)),
        AccountCommand::SetOverdraftLimit(c) => account.set_overdraft_limit(c.limit),
        AccountCommand::SetDailyWireTransferLimit(c) => {
            account.set_daily_wire_transfer_limit(c.limit)
        }
        AccountCommand::DepositCash(c) => account.deposit_cash(c.amount),
        AccountCommand::DepositCheque(c) => account.deposit_cheque(c.amount),
        AccountCommand::WithdrawCash(c) => account.withdraw_cash(c.amount),
        AccountCommand::TryWireTransfer(c) => account.try_wire_transfer(c.amount),
        AccountCommand::StartNewBusinessDay(_) => account.start_new_business_day(),
    }
}

/// Only creation may target an account with no stream
fn open_account(account_id: Uuid, command: AccountCommand) -> Result<Account, DomainError> {
    let reason = match command {
        AccountCommand::CreateAccount(c) => return Account::create(c.account_id, &c.name),
        AccountCommand::SetOverdraftLimit(_) => {
            "The overdraft limit cannot be set on inexistent account."
        }
        AccountCommand::SetDailyWireTransferLimit(_) => {
            "The Daily Wire Transfer limit cannot be set on inexistent account."
        }
        AccountCommand::DepositCheque(_) => {
            "The cheque cannot be deposited to the inexistent account."
        }
        AccountCommand::DepositCash(_) => "The cash cannot be deposited to the inexistent account.",
        AccountCommand::WithdrawCash(_) => "Cash cannot be withdrawn from the inexistent account.",
        AccountCommand::TryWireTransfer(_) => {
            "The wire transfer cannot be done on the inexistent account."
        }
        AccountCommand::StartNewBusinessDay(_) => {
            "The business day cannot be started on the inexistent account."
        }
    };

    Err(DomainError::account_not_found(account_id, reason))
}
