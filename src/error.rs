//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::handlers::CommandKind;
use crate::domain::DomainError;
use crate::event_store::{EventStoreError, ExpectedVersion};

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Version conflict on account {account_id}: expected {expected}, found {actual}")]
    VersionConflict {
        account_id: Uuid,
        expected: ExpectedVersion,
        actual: i64,
    },

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    #[error("No handler subscribed for command {0}")]
    NoHandler(CommandKind),

    #[error("A handler is already subscribed for command {0}")]
    DuplicateSubscription(CommandKind),

    #[error("Event store error: {0}")]
    EventStore(EventStoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EventStoreError> for AppError {
    fn from(err: EventStoreError) -> Self {
        match err {
            EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual,
            } => AppError::VersionConflict {
                account_id: aggregate_id,
                expected,
                actual,
            },
            other => AppError::EventStore(other),
        }
    }
}

/// Malformed JSON bodies, missing fields and non-numeric amounts
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl AppError {
    /// A retry of the whole load-execute-persist cycle may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::VersionConflict { .. } => true,
            AppError::EventStore(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// The caller sent something the service refuses
    pub fn is_client_error(&self) -> bool {
        match self {
            AppError::InvalidRequest(_) => true,
            AppError::Domain(e) => e.is_client_error(),
            _ => false,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 409 Conflict
            AppError::VersionConflict { expected, actual, .. } => (
                StatusCode::CONFLICT,
                "version_conflict",
                Some(format!("expected {}, found {}", expected, actual)),
            ),

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => match domain_err {
                DomainError::InvalidAccountName => {
                    (StatusCode::BAD_REQUEST, "invalid_account_name", None)
                }
                DomainError::InvalidAmount(msg) => {
                    (StatusCode::BAD_REQUEST, "invalid_amount", Some(msg.to_string()))
                }
                DomainError::InvalidLimit(msg) => {
                    (StatusCode::BAD_REQUEST, "invalid_limit", Some(msg.to_string()))
                }
                DomainError::InsufficientFunds {
                    requested,
                    available,
                    ..
                } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "insufficient_funds",
                    Some(format!("requested {}, available {}", requested, available)),
                ),
                DomainError::AccountNotFound { account_id, .. } => (
                    StatusCode::NOT_FOUND,
                    "account_not_found",
                    Some(account_id.to_string()),
                ),
                DomainError::AccountAlreadyExists(id) => (
                    StatusCode::CONFLICT,
                    "account_already_exists",
                    Some(id.to_string()),
                ),
                DomainError::AccountNotCreated => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "account_not_created", None)
                }
                DomainError::AmountOverflow => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "amount_overflow", None)
                }
            },

            // 500 Internal Server Error
            AppError::NoHandler(kind) | AppError::DuplicateSubscription(kind) => {
                tracing::error!("Command routing error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "routing_error", Some(kind.to_string()))
            }
            AppError::EventStore(e) => {
                tracing::error!("Event store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "event_store_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
