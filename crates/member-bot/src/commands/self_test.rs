//! Self test command - confirms the bot is wired up.

use crate::commands::CommandHandler;
use crate::delivery::Delivery;
use async_trait::async_trait;
use std::sync::Arc;

pub const SELF_TEST_MESSAGE: &str = "✅ 測試指令成功！外掛運作正常。";

pub struct SelfTestHandler {
    delivery: Arc<dyn Delivery>,
}

impl SelfTestHandler {
    pub fn new(delivery: Arc<dyn Delivery>) -> Self {
        Self { delivery }
    }
}

#[async_trait]
impl CommandHandler for SelfTestHandler {
    fn name(&self) -> &str {
        "self_test"
    }

    async fn execute(&self, chat_id: i64, _user_id: i64, _display_name: &str) {
        self.delivery.reply(chat_id, SELF_TEST_MESSAGE, None).await;
    }
}
