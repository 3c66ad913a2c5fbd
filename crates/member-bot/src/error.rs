//! Application error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use member_store::StoreError;
use serde::Serialize;
use telegram_client::TelegramError;
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Error: Invalid or missing User ID.")]
    InvalidMember,

    #[error("Error: Invalid operation specified. Must be \"add\" or \"deduct\".")]
    InvalidOperation,

    #[error("Error: Points must be a positive number greater than zero.")]
    InvalidPoints,

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("This user is excluded from the points ledger.")]
    Excluded,

    #[error("Failed to adjust points. The transaction may have been blocked by the ledger (e.g., insufficient funds).")]
    AdjustmentBlocked,

    #[error("Permission denied")]
    Forbidden,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => AppError::MemberNotFound(id),
            StoreError::InvalidMemberCode(_) => AppError::InvalidMember,
            StoreError::InvalidAmount(_) => AppError::InvalidPoints,
            StoreError::Excluded(_) => AppError::Excluded,
            StoreError::InsufficientBalance { .. } | StoreError::BalanceOverflow { .. } => {
                AppError::AdjustmentBlocked
            }
            other => AppError::Store(other),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            AppError::InvalidMember => (StatusCode::BAD_REQUEST, "INVALID_MEMBER"),
            AppError::InvalidOperation => (StatusCode::BAD_REQUEST, "INVALID_OPERATION"),
            AppError::InvalidPoints => (StatusCode::BAD_REQUEST, "INVALID_POINTS"),
            AppError::MemberNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Excluded => (StatusCode::UNPROCESSABLE_ENTITY, "EXCLUDED"),
            AppError::AdjustmentBlocked => (StatusCode::UNPROCESSABLE_ENTITY, "ADJUSTMENT_BLOCKED"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED"),
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        };

        // Internal detail stays in the logs.
        let error = match &self {
            AppError::Config(_) | AppError::Store(_) => {
                tracing::error!("{}", self);
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Failure marker returned by the delivery transport.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Delivery transport is not configured")]
    NotConfigured,

    #[error("Delivery failed: {0}")]
    Failed(String),
}

impl From<TelegramError> for DeliveryError {
    fn from(e: TelegramError) -> Self {
        match e {
            TelegramError::NotConfigured => DeliveryError::NotConfigured,
            other => DeliveryError::Failed(other.to_string()),
        }
    }
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;
