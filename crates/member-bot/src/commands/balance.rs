//! Balance command - shows the member's points balance.

use crate::commands::{not_registered_message, CommandHandler};
use crate::delivery::Delivery;
use crate::members::MemberDirectory;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

pub const LEDGER_UNAVAILABLE_MESSAGE: &str = "錯誤：積分系統未啟用。";

pub struct BalanceHandler {
    delivery: Arc<dyn Delivery>,
    members: Arc<dyn MemberDirectory>,
    register_trigger: String,
}

impl BalanceHandler {
    pub fn new(
        delivery: Arc<dyn Delivery>,
        members: Arc<dyn MemberDirectory>,
        register_trigger: String,
    ) -> Self {
        Self {
            delivery,
            members,
            register_trigger,
        }
    }

    async fn balance_reply(&self, user_id: i64) -> String {
        let member = match self.members.find_member(user_id).await {
            Ok(Some(member)) => member,
            Ok(None) => return not_registered_message(&self.register_trigger),
            Err(e) => {
                error!(user_id, "Member lookup failed: {}", e);
                return LEDGER_UNAVAILABLE_MESSAGE.to_string();
            }
        };

        match self.members.balance(&member).await {
            Ok(balance) => {
                info!(user_id, member_id = member.id, balance, "Balance check");
                format!("您的目前積分餘額為：{}", balance)
            }
            Err(e) => {
                error!(user_id, member_id = member.id, "Balance lookup failed: {}", e);
                LEDGER_UNAVAILABLE_MESSAGE.to_string()
            }
        }
    }
}

#[async_trait]
impl CommandHandler for BalanceHandler {
    fn name(&self) -> &str {
        "balance"
    }

    async fn execute(&self, chat_id: i64, user_id: i64, _display_name: &str) {
        let reply = self.balance_reply(user_id).await;
        self.delivery.reply(chat_id, &reply, None).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingDelivery, UnavailableDirectory};
    use member_store::{LedgerMemo, MemberStore};

    #[tokio::test]
    async fn test_balance_for_member() {
        let delivery = Arc::new(RecordingDelivery::new());
        let store = Arc::new(MemberStore::memory());
        let member = store.create(42, "Ada").await.unwrap();
        store
            .credit(member.id, 150, LedgerMemo::new("test", "seed"))
            .await
            .unwrap();

        let handler = BalanceHandler::new(delivery.clone(), store, "註冊".into());
        handler.execute(10, 42, "Ada").await;

        assert_eq!(delivery.texts(), vec!["您的目前積分餘額為：150"]);
    }

    #[tokio::test]
    async fn test_balance_not_registered() {
        let delivery = Arc::new(RecordingDelivery::new());
        let store = Arc::new(MemberStore::memory());

        let handler = BalanceHandler::new(delivery.clone(), store, "註冊".into());
        handler.execute(10, 99, "Bob").await;

        assert_eq!(delivery.texts(), vec!["您尚未註冊，請先輸入「註冊」。"]);
    }

    #[tokio::test]
    async fn test_balance_ledger_unavailable() {
        let delivery = Arc::new(RecordingDelivery::new());
        let handler =
            BalanceHandler::new(delivery.clone(), Arc::new(UnavailableDirectory), "註冊".into());

        handler.execute(10, 42, "Ada").await;

        assert_eq!(delivery.texts(), vec![LEDGER_UNAVAILABLE_MESSAGE]);
    }
}
