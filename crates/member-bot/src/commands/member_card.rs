//! Member card command - sends a QR code identifying the member.

use crate::commands::{not_registered_message, CommandHandler, GENERIC_FAILURE_MESSAGE};
use crate::delivery::Delivery;
use crate::members::MemberDirectory;
use async_trait::async_trait;
use member_store::MemberCode;
use std::sync::Arc;
use tracing::{error, info};

pub const MEMBER_CARD_CAPTION: &str = "這是您的專屬會員卡 QR Code。";

/// Pixel size requested from the QR service.
const QR_SIZE: &str = "250x250";

pub struct MemberCardHandler {
    delivery: Arc<dyn Delivery>,
    members: Arc<dyn MemberDirectory>,
    qr_service_url: String,
    register_trigger: String,
}

impl MemberCardHandler {
    pub fn new(
        delivery: Arc<dyn Delivery>,
        members: Arc<dyn MemberDirectory>,
        qr_service_url: String,
        register_trigger: String,
    ) -> Self {
        Self {
            delivery,
            members,
            qr_service_url,
            register_trigger,
        }
    }

    /// URL of the QR image encoding `code`.
    pub fn qr_code_url(&self, code: &MemberCode) -> String {
        format!(
            "{}?size={}&data={}",
            self.qr_service_url,
            QR_SIZE,
            urlencoding::encode(&code.to_string())
        )
    }
}

#[async_trait]
impl CommandHandler for MemberCardHandler {
    fn name(&self) -> &str {
        "member_card"
    }

    async fn execute(&self, chat_id: i64, user_id: i64, _display_name: &str) {
        let member = match self.members.find_member(user_id).await {
            Ok(Some(member)) => member,
            Ok(None) => {
                let reply = not_registered_message(&self.register_trigger);
                self.delivery.reply(chat_id, &reply, None).await;
                return;
            }
            Err(e) => {
                error!(user_id, "Member lookup failed: {}", e);
                self.delivery
                    .reply(chat_id, GENERIC_FAILURE_MESSAGE, None)
                    .await;
                return;
            }
        };

        let url = self.qr_code_url(&member.member_code());
        info!(user_id, member_id = member.id, "Sending member card");
        self.delivery
            .reply_image(chat_id, &url, MEMBER_CARD_CAPTION)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingDelivery;
    use member_store::MemberStore;

    const QR_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

    #[tokio::test]
    async fn test_member_card_sends_qr() {
        let delivery = Arc::new(RecordingDelivery::new());
        let store = Arc::new(MemberStore::memory());
        store.create(42, "Ada").await.unwrap();

        let handler = MemberCardHandler::new(delivery.clone(), store, QR_URL.into(), "註冊".into());
        handler.execute(10, 42, "Ada").await;

        let sent = delivery.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].image_url.as_deref(),
            Some("https://api.qrserver.com/v1/create-qr-code/?size=250x250&data=tgvipmem_user_id%3A42")
        );
        assert_eq!(sent[0].text, MEMBER_CARD_CAPTION);
    }

    #[tokio::test]
    async fn test_member_card_requires_registration() {
        let delivery = Arc::new(RecordingDelivery::new());
        let store = Arc::new(MemberStore::memory());

        let handler = MemberCardHandler::new(delivery.clone(), store, QR_URL.into(), "註冊".into());
        handler.execute(10, 42, "Ada").await;

        let sent = delivery.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].image_url.is_none());
        assert_eq!(sent[0].text, "您尚未註冊，請先輸入「註冊」。");
    }
}
