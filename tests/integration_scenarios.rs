//! Account scenarios through the command bus

use cqrs_account::domain::{AccountEvent, Amount};
use cqrs_account::handlers::{
    AccountCommand, CreateAccount, DepositCash, DepositCheque, SetDailyWireTransferLimit,
    SetOverdraftLimit, StartNewBusinessDay, TryWireTransfer, WithdrawCash,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

mod common;

use common::Scenario;

fn amount(value: Decimal) -> Amount {
    Amount::new(value).unwrap()
}

fn create(account_id: Uuid) -> AccountCommand {
    CreateAccount::new(account_id, "Jake Sanders").into()
}

fn cash(account_id: Uuid, value: Decimal) -> AccountCommand {
    DepositCash {
        account_id,
        amount: value,
    }
    .into()
}

#[tokio::test]
async fn test_withdraw_from_funded_account() {
    let account_id = Uuid::new_v4();

    let then = Scenario::new()
        .given(vec![create(account_id), cash(account_id, dec!(1000))])
        .await
        .when(WithdrawCash {
            account_id,
            amount: dec!(500),
        })
        .await
        .then_events(vec![AccountEvent::CashWithdrawn {
            account_id,
            amount: amount(dec!(500)),
        }]);

    let account = then.account().await;
    assert_eq!(account.balance().value(), dec!(500));
    assert_eq!(account.daily_limit_used(), dec!(500));
}

#[tokio::test]
async fn test_withdraw_up_to_overdraft() {
    let account_id = Uuid::new_v4();

    let then = Scenario::new()
        .given(vec![
            create(account_id),
            cash(account_id, dec!(1000)),
            SetOverdraftLimit {
                account_id,
                limit: dec!(3000),
            }
            .into(),
        ])
        .await
        .when(WithdrawCash {
            account_id,
            amount: dec!(4000),
        })
        .await
        .then_events(vec![AccountEvent::CashWithdrawn {
            account_id,
            amount: amount(dec!(4000)),
        }]);

    assert_eq!(then.account().await.balance().value(), dec!(-3000));
}

#[tokio::test]
async fn test_withdraw_past_overdraft_blocks() {
    let account_id = Uuid::new_v4();

    let then = Scenario::new()
        .given(vec![
            create(account_id),
            cash(account_id, dec!(1000)),
            SetOverdraftLimit {
                account_id,
                limit: dec!(3000),
            }
            .into(),
        ])
        .await
        .when(WithdrawCash {
            account_id,
            amount: dec!(4000.01),
        })
        .await
        .then_events(vec![
            AccountEvent::WithdrawalFailed {
                account_id,
                amount: amount(dec!(4000.01)),
            },
            AccountEvent::AccountBlocked { account_id },
        ]);

    assert!(then.account().await.is_blocked());
}

#[tokio::test]
async fn test_withdraw_past_daily_limit_blocks() {
    let account_id = Uuid::new_v4();

    Scenario::new()
        .given(vec![
            create(account_id),
            cash(account_id, dec!(1000)),
            SetDailyWireTransferLimit {
                account_id,
                limit: dec!(100),
            }
            .into(),
            SetOverdraftLimit {
                account_id,
                limit: dec!(0),
            }
            .into(),
        ])
        .await
        .when(WithdrawCash {
            account_id,
            amount: dec!(150),
        })
        .await
        .then_events(vec![
            AccountEvent::WithdrawalFailed {
                account_id,
                amount: amount(dec!(150)),
            },
            AccountEvent::AccountBlocked { account_id },
        ]);
}

#[tokio::test]
async fn test_blocked_account_refuses_withdrawal_without_new_block() {
    let account_id = Uuid::new_v4();

    Scenario::new()
        .given(vec![
            create(account_id),
            cash(account_id, dec!(100)),
            SetOverdraftLimit {
                account_id,
                limit: dec!(0),
            }
            .into(),
            WithdrawCash {
                account_id,
                amount: dec!(200),
            }
            .into(),
        ])
        .await
        .when(WithdrawCash {
            account_id,
            amount: dec!(10),
        })
        .await
        .then_events(vec![AccountEvent::WithdrawalFailed {
            account_id,
            amount: amount(dec!(10)),
        }]);
}

#[tokio::test]
async fn test_blocked_account_is_blocked_again_past_overdraft() {
    let account_id = Uuid::new_v4();

    let then = Scenario::new()
        .given(vec![
            create(account_id),
            cash(account_id, dec!(100)),
            SetOverdraftLimit {
                account_id,
                limit: dec!(0),
            }
            .into(),
            WithdrawCash {
                account_id,
                amount: dec!(200),
            }
            .into(),
        ])
        .await
        .when(WithdrawCash {
            account_id,
            amount: dec!(500),
        })
        .await
        .then_events(vec![
            AccountEvent::WithdrawalFailed {
                account_id,
                amount: amount(dec!(500)),
            },
            AccountEvent::AccountBlocked { account_id },
        ]);

    let account = then.account().await;
    assert!(account.is_blocked());
    assert_eq!(account.balance().value(), dec!(100));
    assert_eq!(then.stream_version().await, 7);
}

#[tokio::test]
async fn test_blocked_account_is_blocked_again_past_daily_limit() {
    let account_id = Uuid::new_v4();

    Scenario::new()
        .given(vec![
            create(account_id),
            cash(account_id, dec!(1000)),
            SetDailyWireTransferLimit {
                account_id,
                limit: dec!(100),
            }
            .into(),
            TryWireTransfer {
                account_id,
                amount: dec!(150),
            }
            .into(),
        ])
        .await
        .when(TryWireTransfer {
            account_id,
            amount: dec!(150),
        })
        .await
        .then_events(vec![
            AccountEvent::WireTransferFailed {
                account_id,
                amount: amount(dec!(150)),
            },
            AccountEvent::AccountBlocked { account_id },
        ]);
}

#[tokio::test]
async fn test_wire_transfer_past_daily_limit_blocks() {
    let account_id = Uuid::new_v4();

    let then = Scenario::new()
        .given(vec![
            create(account_id),
            cash(account_id, dec!(1000)),
            SetDailyWireTransferLimit {
                account_id,
                limit: dec!(500),
            }
            .into(),
            TryWireTransfer {
                account_id,
                amount: dec!(500),
            }
            .into(),
        ])
        .await
        .when(TryWireTransfer {
            account_id,
            amount: dec!(0.01),
        })
        .await
        .then_events(vec![
            AccountEvent::WireTransferFailed {
                account_id,
                amount: amount(dec!(0.01)),
            },
            AccountEvent::AccountBlocked { account_id },
        ]);

    let account = then.account().await;
    assert!(account.is_blocked());
    assert_eq!(account.balance().value(), dec!(500));
}

#[tokio::test]
async fn test_wire_transfer_never_uses_overdraft() {
    let account_id = Uuid::new_v4();

    Scenario::new()
        .given(vec![
            create(account_id),
            cash(account_id, dec!(100)),
            SetOverdraftLimit {
                account_id,
                limit: dec!(1000),
            }
            .into(),
        ])
        .await
        .when(TryWireTransfer {
            account_id,
            amount: dec!(150),
        })
        .await
        .then_error("The account does not have enough funds for requested wire transfer.");
}

#[tokio::test]
async fn test_new_business_day_releases_cheques_and_unblocks() {
    let account_id = Uuid::new_v4();

    let then = Scenario::new()
        .given(vec![
            create(account_id),
            cash(account_id, dec!(1000)),
            SetOverdraftLimit {
                account_id,
                limit: dec!(0),
            }
            .into(),
            WithdrawCash {
                account_id,
                amount: dec!(5000),
            }
            .into(),
            DepositCheque {
                account_id,
                amount: dec!(1000),
            }
            .into(),
        ])
        .await
        .when(StartNewBusinessDay { account_id })
        .await
        .then_events(vec![
            AccountEvent::BusinessDayStarted { account_id },
            AccountEvent::AccountUnblocked { account_id },
        ]);

    let account = then.account().await;
    assert!(!account.is_blocked());
    assert_eq!(account.balance().value(), dec!(2000));
    assert_eq!(account.daily_limit_used(), Decimal::ZERO);
    assert_eq!(account.pending_amount(), Decimal::ZERO);
}

#[tokio::test]
async fn test_new_business_day_without_pending_keeps_block() {
    let account_id = Uuid::new_v4();

    let then = Scenario::new()
        .given(vec![
            create(account_id),
            SetOverdraftLimit {
                account_id,
                limit: dec!(0),
            }
            .into(),
            WithdrawCash {
                account_id,
                amount: dec!(1),
            }
            .into(),
        ])
        .await
        .when(StartNewBusinessDay { account_id })
        .await
        .then_events(vec![AccountEvent::BusinessDayStarted { account_id }]);

    assert!(then.account().await.is_blocked());
}

#[tokio::test]
async fn test_cash_deposit_unblocks() {
    let account_id = Uuid::new_v4();

    Scenario::new()
        .given(vec![
            create(account_id),
            SetOverdraftLimit {
                account_id,
                limit: dec!(0),
            }
            .into(),
            WithdrawCash {
                account_id,
                amount: dec!(1),
            }
            .into(),
        ])
        .await
        .when(DepositCash {
            account_id,
            amount: dec!(25),
        })
        .await
        .then_events(vec![
            AccountEvent::CashDeposited {
                account_id,
                amount: amount(dec!(25)),
            },
            AccountEvent::AccountUnblocked { account_id },
        ]);
}

#[tokio::test]
async fn test_negative_limits_are_rejected() {
    let account_id = Uuid::new_v4();

    let then = Scenario::new()
        .given(vec![create(account_id)])
        .await
        .when(SetOverdraftLimit {
            account_id,
            limit: dec!(-1),
        })
        .await
        .then_error("The overdraft limit cannot be negative.");
    assert_eq!(then.stream_version().await, 1);

    Scenario::new()
        .given(vec![create(account_id)])
        .await
        .when(SetDailyWireTransferLimit {
            account_id,
            limit: dec!(-1),
        })
        .await
        .then_error("The Daily Wire Transfer limit cannot be negative.");
}

#[tokio::test]
async fn test_zero_amounts_are_rejected() {
    let account_id = Uuid::new_v4();

    Scenario::new()
        .given(vec![create(account_id)])
        .await
        .when(DepositCash {
            account_id,
            amount: dec!(0),
        })
        .await
        .then_error("The deposited cash amount should be greater than 0.");

    Scenario::new()
        .given(vec![create(account_id)])
        .await
        .when(DepositCheque {
            account_id,
            amount: dec!(0),
        })
        .await
        .then_error("The deposited cheque amount should be greater than 0.");

    Scenario::new()
        .given(vec![create(account_id)])
        .await
        .when(WithdrawCash {
            account_id,
            amount: dec!(0),
        })
        .await
        .then_error("Withdrawn Cash amount should be greater than 0.");

    Scenario::new()
        .given(vec![create(account_id)])
        .await
        .when(TryWireTransfer {
            account_id,
            amount: dec!(0),
        })
        .await
        .then_error("Wire Transfer amount should be greater than 0.");
}

#[tokio::test]
async fn test_double_create_is_rejected() {
    let account_id = Uuid::new_v4();

    let then = Scenario::new()
        .given(vec![create(account_id)])
        .await
        .when(CreateAccount::new(account_id, "Another Name"))
        .await
        .then_error("The account with specified ID already exists.");

    assert_eq!(then.stream_version().await, 1);
    assert_eq!(then.account().await.name(), "Jake Sanders");
}
