//! Command definitions
//!
//! Commands represent intentions to change the system state.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::AccountEvent;
use crate::error::AppResult;

/// Command to open a new account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAccount {
    pub account_id: Uuid,
    pub name: String,
}

impl CreateAccount {
    pub fn new(account_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            account_id,
            name: name.into(),
        }
    }
}

/// Command to set how far cash withdrawals may overdraw the balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOverdraftLimit {
    pub account_id: Uuid,
    pub limit: Decimal,
}

/// Command to set the per-business-day ceiling on outgoing money
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDailyWireTransferLimit {
    pub account_id: Uuid,
    pub limit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositCash {
    pub account_id: Uuid,
    pub amount: Decimal,
}

/// Cheques clear at the next business day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositCheque {
    pub account_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawCash {
    pub account_id: Uuid,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryWireTransfer {
    pub account_id: Uuid,
    pub amount: Decimal,
}

/// Command to roll the account over to a new business day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartNewBusinessDay {
    pub account_id: Uuid,
}

/// Every command the account service accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AccountCommand {
    CreateAccount(CreateAccount),
    SetOverdraftLimit(SetOverdraftLimit),
    SetDailyWireTransferLimit(SetDailyWireTransferLimit),
    DepositCash(DepositCash),
    DepositCheque(DepositCheque),
    WithdrawCash(WithdrawCash),
    TryWireTransfer(TryWireTransfer),
    StartNewBusinessDay(StartNewBusinessDay),
}

impl AccountCommand {
    /// The account the command targets
    pub fn account_id(&self) -> Uuid {
        match self {
            AccountCommand::CreateAccount(c) => c.account_id,
            AccountCommand::SetOverdraftLimit(c) => c.account_id,
            AccountCommand::SetDailyWireTransferLimit(c) => c.account_id,
            AccountCommand::DepositCash(c) => c.account_id,
            AccountCommand::DepositCheque(c) => c.account_id,
            AccountCommand::WithdrawCash(c) => c.account_id,
            AccountCommand::TryWireTransfer(c) => c.account_id,
            AccountCommand::StartNewBusinessDay(c) => c.account_id,
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            AccountCommand::CreateAccount(_) => CommandKind::CreateAccount,
            AccountCommand::SetOverdraftLimit(_) => CommandKind::SetOverdraftLimit,
            AccountCommand::SetDailyWireTransferLimit(_) => CommandKind::SetDailyWireTransferLimit,
            AccountCommand::DepositCash(_) => CommandKind::DepositCash,
            AccountCommand::DepositCheque(_) => CommandKind::DepositCheque,
            AccountCommand::WithdrawCash(_) => CommandKind::WithdrawCash,
            AccountCommand::TryWireTransfer(_) => CommandKind::TryWireTransfer,
            AccountCommand::StartNewBusinessDay(_) => CommandKind::StartNewBusinessDay,
        }
    }
}

macro_rules! impl_from_command {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for AccountCommand {
                fn from(command: $variant) -> Self {
                    AccountCommand::$variant(command)
                }
            }
        )*
    };
}

impl_from_command!(
    CreateAccount,
    SetOverdraftLimit,
    SetDailyWireTransferLimit,
    DepositCash,
    DepositCheque,
    WithdrawCash,
    TryWireTransfer,
    StartNewBusinessDay,
);

/// Routing key for the command bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    CreateAccount,
    SetOverdraftLimit,
    SetDailyWireTransferLimit,
    DepositCash,
    DepositCheque,
    WithdrawCash,
    TryWireTransfer,
    StartNewBusinessDay,
}

impl CommandKind {
    pub const ALL: [CommandKind; 8] = [
        CommandKind::CreateAccount,
        CommandKind::SetOverdraftLimit,
        CommandKind::SetDailyWireTransferLimit,
        CommandKind::DepositCash,
        CommandKind::DepositCheque,
        CommandKind::WithdrawCash,
        CommandKind::TryWireTransfer,
        CommandKind::StartNewBusinessDay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::CreateAccount => "CreateAccount",
            CommandKind::SetOverdraftLimit => "SetOverdraftLimit",
            CommandKind::SetDailyWireTransferLimit => "SetDailyWireTransferLimit",
            CommandKind::DepositCash => "DepositCash",
            CommandKind::DepositCheque => "DepositCheque",
            CommandKind::WithdrawCash => "WithdrawCash",
            CommandKind::TryWireTransfer => "TryWireTransfer",
            CommandKind::StartNewBusinessDay => "StartNewBusinessDay",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successfully handled command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutcome {
    pub account_id: Uuid,
    /// Events appended by this command, in order
    pub events: Vec<AccountEvent>,
    /// Stream version after the append
    pub version: i64,
}

impl CommandOutcome {
    /// Whether the command ended in a business failure (withdrawal or
    /// transfer refused) rather than the requested effect
    pub fn is_business_failure(&self) -> bool {
        self.events.iter().any(AccountEvent::is_failure)
    }
}

/// Structured success/failure returned by the command bus
pub type CommandResponse = AppResult<CommandOutcome>;
