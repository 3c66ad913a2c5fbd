//! Start command - greets the user and shows the command keyboard.

use crate::commands::CommandHandler;
use crate::config::TriggerConfig;
use crate::delivery::{Delivery, ReplyKeyboardMarkup};
use async_trait::async_trait;
use std::sync::Arc;
use telegram_client::escape_html;

pub struct StartHandler {
    delivery: Arc<dyn Delivery>,
    triggers: TriggerConfig,
}

impl StartHandler {
    pub fn new(delivery: Arc<dyn Delivery>, triggers: TriggerConfig) -> Self {
        Self { delivery, triggers }
    }

    fn keyboard(&self) -> ReplyKeyboardMarkup {
        ReplyKeyboardMarkup::from_rows(vec![
            vec![self.triggers.register.as_str(), self.triggers.balance.as_str()],
            vec![self.triggers.member_card.as_str()],
        ])
    }
}

#[async_trait]
impl CommandHandler for StartHandler {
    fn name(&self) -> &str {
        "start"
    }

    async fn execute(&self, chat_id: i64, _user_id: i64, display_name: &str) {
        let welcome = format!(
            "您好，{}！歡迎使用會員整合機器人。\n\n請輸入「{}」來綁定您的帳戶。",
            escape_html(display_name),
            escape_html(&self.triggers.register),
        );

        self.delivery
            .reply(chat_id, &welcome, Some(&self.keyboard()))
            .await;
    }
}
