//! Member store errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Telegram user {0} is already registered")]
    AlreadyRegistered(i64),

    #[error("Member not found: {0}")]
    NotFound(String),

    #[error("Member {0} is excluded from the points ledger")]
    Excluded(u64),

    #[error("Insufficient balance: have {balance}, need {requested}")]
    InsufficientBalance { balance: i64, requested: i64 },

    #[error("Balance {balance} cannot absorb {delta} points")]
    BalanceOverflow { balance: i64, delta: i64 },

    #[error("Points must be a positive number, got {0}")]
    InvalidAmount(i64),

    #[error("Invalid member code: {0}")]
    InvalidMemberCode(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
