//! Outbound message delivery.

use crate::error::DeliveryError;
use async_trait::async_trait;
use telegram_client::TelegramClient;
use tracing::{error, warn};

pub use telegram_client::ReplyKeyboardMarkup;

/// Proof that a message was accepted by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: i64,
}

/// Best-effort text and image delivery to a chat.
///
/// Failures come back as [`DeliveryError`] values; callers decide whether a
/// failed send matters.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&ReplyKeyboardMarkup>,
    ) -> Result<DeliveryReceipt, DeliveryError>;

    async fn send_image(
        &self,
        chat_id: i64,
        image_url: &str,
        caption: &str,
    ) -> Result<DeliveryReceipt, DeliveryError>;

    /// Send a text reply, logging instead of returning a failure.
    async fn reply(&self, chat_id: i64, text: &str, keyboard: Option<&ReplyKeyboardMarkup>) {
        match self.send_text(chat_id, text, keyboard).await {
            Ok(_) => {}
            Err(DeliveryError::NotConfigured) => {
                error!(chat_id, "Reply dropped: Telegram bot token is not configured")
            }
            Err(e) => warn!(chat_id, "Failed to send reply: {}", e),
        }
    }

    /// Send an image reply, logging instead of returning a failure.
    async fn reply_image(&self, chat_id: i64, image_url: &str, caption: &str) {
        match self.send_image(chat_id, image_url, caption).await {
            Ok(_) => {}
            Err(DeliveryError::NotConfigured) => {
                error!(chat_id, "Image dropped: Telegram bot token is not configured")
            }
            Err(e) => warn!(chat_id, "Failed to send image: {}", e),
        }
    }
}

#[async_trait]
impl Delivery for TelegramClient {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&ReplyKeyboardMarkup>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let sent = self.send_message(chat_id, text, keyboard).await?;
        Ok(DeliveryReceipt {
            message_id: sent.message_id,
        })
    }

    async fn send_image(
        &self,
        chat_id: i64,
        image_url: &str,
        caption: &str,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let sent = self.send_photo(chat_id, image_url, caption).await?;
        Ok(DeliveryReceipt {
            message_id: sent.message_id,
        })
    }
}
