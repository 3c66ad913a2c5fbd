//! Register command - creates a member for the Telegram user.

use crate::commands::CommandHandler;
use crate::delivery::Delivery;
use crate::members::MemberDirectory;
use async_trait::async_trait;
use member_store::StoreError;
use std::sync::Arc;
use tracing::{error, info};

pub const ALREADY_REGISTERED_MESSAGE: &str = "您已經註冊過了！";
pub const REGISTERED_MESSAGE: &str = "✅ 註冊成功！您的帳號已建立。";
pub const REGISTRATION_FAILED_MESSAGE: &str = "註冊失敗，系統發生錯誤，請聯絡管理員。";

pub struct RegisterHandler {
    delivery: Arc<dyn Delivery>,
    members: Arc<dyn MemberDirectory>,
}

impl RegisterHandler {
    pub fn new(delivery: Arc<dyn Delivery>, members: Arc<dyn MemberDirectory>) -> Self {
        Self { delivery, members }
    }

    async fn register(&self, user_id: i64, display_name: &str) -> &'static str {
        match self.members.find_member(user_id).await {
            Ok(Some(_)) => return ALREADY_REGISTERED_MESSAGE,
            Ok(None) => {}
            Err(e) => {
                error!(user_id, "Registration lookup failed: {}", e);
                return REGISTRATION_FAILED_MESSAGE;
            }
        }

        match self.members.create_member(user_id, display_name).await {
            Ok(member) => {
                info!(user_id, member_id = member.id, "Member registered");
                REGISTERED_MESSAGE
            }
            // Lost a race with a concurrent registration.
            Err(StoreError::AlreadyRegistered(_)) => ALREADY_REGISTERED_MESSAGE,
            Err(e) => {
                error!(user_id, "Registration failed: {}", e);
                REGISTRATION_FAILED_MESSAGE
            }
        }
    }
}

#[async_trait]
impl CommandHandler for RegisterHandler {
    fn name(&self) -> &str {
        "register"
    }

    async fn execute(&self, chat_id: i64, user_id: i64, display_name: &str) {
        let reply = self.register(user_id, display_name).await;
        self.delivery.reply(chat_id, reply, None).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingDelivery, UnavailableDirectory};
    use member_store::MemberStore;

    #[tokio::test]
    async fn test_register_once() {
        let delivery = Arc::new(RecordingDelivery::new());
        let store = Arc::new(MemberStore::memory());
        let handler = RegisterHandler::new(delivery.clone(), store.clone());

        handler.execute(10, 42, "Ada").await;
        handler.execute(10, 42, "Ada").await;

        assert_eq!(store.count().await, 1);
        let member = store.find_by_telegram_id(42).await.unwrap();
        assert_eq!(member.display_name, "Ada");

        assert_eq!(
            delivery.texts(),
            vec![REGISTERED_MESSAGE, ALREADY_REGISTERED_MESSAGE]
        );
    }

    #[tokio::test]
    async fn test_register_failure_is_generic() {
        let delivery = Arc::new(RecordingDelivery::new());
        let handler = RegisterHandler::new(delivery.clone(), Arc::new(UnavailableDirectory));

        handler.execute(10, 42, "Ada").await;

        assert_eq!(delivery.texts(), vec![REGISTRATION_FAILED_MESSAGE]);
    }
}
