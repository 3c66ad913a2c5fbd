//! Common test utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use member_bot::{
    commands::Dispatcher,
    config::BotConfig,
    context::{AppContext, Extensions},
    Delivery, MemberDirectory,
};
use member_store::{Member, MemberStore, StoreError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use telegram_client::BotMessage;

pub use member_bot::testing::{RecordingDelivery, SentReply};

/// Member directory over a real store that counts ledger reads.
pub struct CountingDirectory {
    pub store: Arc<MemberStore>,
    balance_calls: AtomicUsize,
}

impl CountingDirectory {
    pub fn new(store: Arc<MemberStore>) -> Self {
        Self {
            store,
            balance_calls: AtomicUsize::new(0),
        }
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MemberDirectory for CountingDirectory {
    async fn find_member(&self, telegram_id: i64) -> Result<Option<Member>, StoreError> {
        self.store.find_member(telegram_id).await
    }

    async fn create_member(
        &self,
        telegram_id: i64,
        display_name: &str,
    ) -> Result<Member, StoreError> {
        self.store.create_member(telegram_id, display_name).await
    }

    async fn balance(&self, member: &Member) -> Result<i64, StoreError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.store.balance(member.id).await
    }
}

/// Build a dispatcher over the given collaborators with default triggers.
pub fn dispatcher(
    delivery: Arc<dyn Delivery>,
    members: Arc<dyn MemberDirectory>,
    extensions: Extensions,
) -> Dispatcher {
    let ctx = AppContext::new(delivery, members, &BotConfig::default(), extensions);
    Dispatcher::new(Arc::new(ctx))
}

/// Incoming message from user 42 in chat 1042.
pub fn message(text: &str) -> BotMessage {
    message_from(42, text)
}

pub fn message_from(user_id: i64, text: &str) -> BotMessage {
    BotMessage {
        chat_id: 1000 + user_id,
        user_id,
        text: text.to_string(),
        display_name: "Ada".to_string(),
    }
}
