//! Telegram client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error ({code}): {description}")]
    Api { code: i64, description: String },

    #[error("Bot token is not configured")]
    NotConfigured,

    #[error("Empty result from {0}")]
    EmptyResult(String),
}
