//! API Routes
//!
//! HTTP endpoint definitions. Writes go through the command bus; reads replay
//! the account stream.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{Account, Aggregate};
use crate::bus::CommandBus;
use crate::domain::{AccountEvent, DomainError, OperationContext};
use crate::error::AppError;
use crate::event_store::{load_aggregate, EventStore};
use crate::handlers::{
    AccountCommand, CommandOutcome, CreateAccount, DepositCash, DepositCheque,
    SetDailyWireTransferLimit, SetOverdraftLimit, StartNewBusinessDay, TryWireTransfer,
    WithdrawCash,
};

/// Shared state for all routes
#[derive(Clone)]
pub struct AppState {
    pub bus: CommandBus,
    pub store: Arc<dyn EventStore>,
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Generated when absent
    #[serde(default)]
    pub account_id: Option<Uuid>,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LimitRequest {
    pub limit: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CommandResponseBody {
    pub account_id: Uuid,
    pub version: i64,
    /// True when the account refused the operation and recorded the refusal
    pub refused: bool,
    pub events: Vec<AccountEvent>,
}

impl From<CommandOutcome> for CommandResponseBody {
    fn from(outcome: CommandOutcome) -> Self {
        Self {
            account_id: outcome.account_id,
            version: outcome.version,
            refused: outcome.is_business_failure(),
            events: outcome.events,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccountView {
    pub account_id: Uuid,
    pub name: String,
    pub balance: Decimal,
    pub overdraft_limit: Option<Decimal>,
    pub daily_wire_transfer_limit: Option<Decimal>,
    pub daily_limit_used: Decimal,
    pub current_day_total_transfer: Decimal,
    pub pending_amount: Decimal,
    pub blocked: bool,
    pub version: i64,
}

impl AccountView {
    fn new(account_id: Uuid, account: &Account) -> Self {
        Self {
            account_id,
            name: account.name().to_string(),
            balance: account.balance().value(),
            overdraft_limit: account.overdraft_limit().map(|l| l.value()),
            daily_wire_transfer_limit: account.daily_transfer_limit().map(|l| l.value()),
            daily_limit_used: account.daily_limit_used(),
            current_day_total_transfer: account.current_day_total_transfer(),
            pending_amount: account.pending_amount(),
            blocked: account.is_blocked(),
            version: account.version(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub version: i64,
    pub event_type: String,
    pub event_data: serde_json::Value,
    pub context: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct EventsListResponse {
    pub account_id: Uuid,
    pub events: Vec<EventResponse>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts/:account_id", get(get_account))
        .route("/accounts/:account_id/events", get(get_account_events))
        .route("/accounts/:account_id/overdraft-limit", post(set_overdraft_limit))
        .route(
            "/accounts/:account_id/daily-wire-transfer-limit",
            post(set_daily_wire_transfer_limit),
        )
        .route("/accounts/:account_id/cash-deposits", post(deposit_cash))
        .route("/accounts/:account_id/cheque-deposits", post(deposit_cheque))
        .route("/accounts/:account_id/cash-withdrawals", post(withdraw_cash))
        .route("/accounts/:account_id/wire-transfers", post(wire_transfer))
        .route("/accounts/:account_id/business-days", post(start_business_day))
}

async fn dispatch(
    state: &AppState,
    command: impl Into<AccountCommand>,
    context: OperationContext,
) -> Result<Json<CommandResponseBody>, AppError> {
    let outcome = state.bus.send(command.into(), context).await?;
    Ok(Json(outcome.into()))
}

// =========================================================================
// Commands
// =========================================================================

/// Open a new account
async fn create_account(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CommandResponseBody>), AppError> {
    let Json(request) = payload?;
    let account_id = request.account_id.unwrap_or_else(Uuid::new_v4);
    let body = dispatch(&state, CreateAccount::new(account_id, request.name), context).await?;

    Ok((StatusCode::CREATED, body))
}

async fn set_overdraft_limit(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_id): Path<Uuid>,
    payload: Result<Json<LimitRequest>, JsonRejection>,
) -> Result<Json<CommandResponseBody>, AppError> {
    let Json(request) = payload?;
    let command = SetOverdraftLimit {
        account_id,
        limit: request.limit,
    };
    dispatch(&state, command, context).await
}

async fn set_daily_wire_transfer_limit(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_id): Path<Uuid>,
    payload: Result<Json<LimitRequest>, JsonRejection>,
) -> Result<Json<CommandResponseBody>, AppError> {
    let Json(request) = payload?;
    let command = SetDailyWireTransferLimit {
        account_id,
        limit: request.limit,
    };
    dispatch(&state, command, context).await
}

async fn deposit_cash(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_id): Path<Uuid>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<Json<CommandResponseBody>, AppError> {
    let Json(request) = payload?;
    let command = DepositCash {
        account_id,
        amount: request.amount,
    };
    dispatch(&state, command, context).await
}

async fn deposit_cheque(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_id): Path<Uuid>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<Json<CommandResponseBody>, AppError> {
    let Json(request) = payload?;
    let command = DepositCheque {
        account_id,
        amount: request.amount,
    };
    dispatch(&state, command, context).await
}

async fn withdraw_cash(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_id): Path<Uuid>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<Json<CommandResponseBody>, AppError> {
    let Json(request) = payload?;
    let command = WithdrawCash {
        account_id,
        amount: request.amount,
    };
    dispatch(&state, command, context).await
}

async fn wire_transfer(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_id): Path<Uuid>,
    payload: Result<Json<AmountRequest>, JsonRejection>,
) -> Result<Json<CommandResponseBody>, AppError> {
    let Json(request) = payload?;
    let command = TryWireTransfer {
        account_id,
        amount: request.amount,
    };
    dispatch(&state, command, context).await
}

/// Roll the account over to a new business day
async fn start_business_day(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<CommandResponseBody>, AppError> {
    dispatch(&state, StartNewBusinessDay { account_id }, context).await
}

// =========================================================================
// Queries
// =========================================================================

/// Current account state, rebuilt from its events
async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<AccountView>, AppError> {
    let account = load_aggregate::<Account, _>(state.store.as_ref(), account_id)
        .await?
        .ok_or_else(|| {
            DomainError::account_not_found(account_id, "The account does not exist.")
        })?;

    Ok(Json(AccountView::new(account_id, &account)))
}

/// Raw event stream of an account
async fn get_account_events(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<EventsListResponse>, AppError> {
    let stored = state.store.load(account_id).await?.ok_or_else(|| {
        DomainError::account_not_found(account_id, "The account does not exist.")
    })?;

    let events = stored
        .into_iter()
        .map(|event| EventResponse {
            id: event.id,
            version: event.version,
            event_type: event.event_type,
            event_data: event.event_data,
            context: event.context,
            created_at: event.created_at,
        })
        .collect();

    Ok(Json(EventsListResponse { account_id, events }))
}
