//! Test doubles for the delivery and member collaborators.
//!
//! Compiled for unit tests and behind the `testing` feature for integration
//! tests.

use crate::delivery::{Delivery, DeliveryReceipt, ReplyKeyboardMarkup};
use crate::error::DeliveryError;
use crate::members::MemberDirectory;
use async_trait::async_trait;
use member_store::{Member, StoreError};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One recorded send. Images carry their caption in `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReply {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<ReplyKeyboardMarkup>,
    pub image_url: Option<String>,
}

/// Delivery that records every send and always succeeds.
#[derive(Default)]
pub struct RecordingDelivery {
    sent: Mutex<Vec<SentReply>>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentReply> {
        self.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|r| r.text).collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SentReply>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, reply: SentReply) -> DeliveryReceipt {
        let mut sent = self.lock();
        sent.push(reply);
        DeliveryReceipt {
            message_id: sent.len() as i64,
        }
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&ReplyKeyboardMarkup>,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        Ok(self.record(SentReply {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
            image_url: None,
        }))
    }

    async fn send_image(
        &self,
        chat_id: i64,
        image_url: &str,
        caption: &str,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        Ok(self.record(SentReply {
            chat_id,
            text: caption.to_string(),
            keyboard: None,
            image_url: Some(image_url.to_string()),
        }))
    }
}

/// Member directory whose backend is always down.
pub struct UnavailableDirectory;

#[async_trait]
impl MemberDirectory for UnavailableDirectory {
    async fn find_member(&self, _telegram_id: i64) -> Result<Option<Member>, StoreError> {
        Err(StoreError::Io(std::io::Error::other("ledger offline")))
    }

    async fn create_member(
        &self,
        _telegram_id: i64,
        _display_name: &str,
    ) -> Result<Member, StoreError> {
        Err(StoreError::Io(std::io::Error::other("ledger offline")))
    }

    async fn balance(&self, _member: &Member) -> Result<i64, StoreError> {
        Err(StoreError::Io(std::io::Error::other("ledger offline")))
    }
}
