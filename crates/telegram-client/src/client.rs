//! Telegram Bot API HTTP client.

use crate::error::TelegramError;
use crate::types::*;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Telegram Bot API client.
///
/// The bot token is stored using `SecretString` so it never ends up in
/// logs. A client without a token can be built; every call then fails with
/// [`TelegramError::NotConfigured`].
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    api_url: String,
    token: Option<SecretString>,
}

impl TelegramClient {
    /// Create a new Telegram client.
    pub fn new(
        api_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TelegramError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()).map(SecretString::new),
        })
    }

    /// Whether a bot token is available.
    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    fn method_url(&self, method: &str) -> Result<String, TelegramError> {
        let token = self.token.as_ref().ok_or(TelegramError::NotConfigured)?;
        Ok(format!(
            "{}/bot{}/{}",
            self.api_url,
            token.expose_secret(),
            method
        ))
    }

    async fn call<Req, Res>(&self, method: &str, request: &Req) -> Result<Res, TelegramError>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let url = match self.method_url(method) {
            Ok(url) => url,
            Err(e) => {
                error!("Attempted to call {} but the bot token is not set", method);
                return Err(e);
            }
        };

        let response = self.client.post(url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let parsed: ApiResponse<Res> = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => {
                warn!("{} failed with status {}: {}", method, status, body);
                return Err(TelegramError::Api {
                    code: i64::from(status.as_u16()),
                    description: body,
                });
            }
        };

        if !parsed.ok {
            let description = parsed.description.unwrap_or_default();
            warn!("{} rejected: {}", method, description);
            return Err(TelegramError::Api {
                code: parsed.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description,
            });
        }

        parsed
            .result
            .ok_or_else(|| TelegramError::EmptyResult(method.to_string()))
    }

    /// Fetch the bot's own user record. Used as a health probe.
    #[instrument(skip(self))]
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Check if the Bot API accepts our token.
    pub async fn health_check(&self) -> bool {
        self.get_me().await.is_ok()
    }

    /// Send an HTML-formatted text message, optionally with a reply keyboard.
    #[instrument(skip(self, text, keyboard))]
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&ReplyKeyboardMarkup>,
    ) -> Result<Message, TelegramError> {
        let request = SendMessageRequest {
            chat_id,
            text: text.to_string(),
            parse_mode: "HTML".to_string(),
            reply_markup: keyboard.cloned(),
        };

        let sent: Message = self.call("sendMessage", &request).await?;
        debug!("Sent message {} to {}", sent.message_id, chat_id);
        Ok(sent)
    }

    /// Send a photo by URL with a caption.
    #[instrument(skip(self, caption))]
    pub async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: &str,
    ) -> Result<Message, TelegramError> {
        let request = SendPhotoRequest {
            chat_id,
            photo: photo_url.to_string(),
            caption: caption.to_string(),
        };

        let sent: Message = self.call("sendPhoto", &request).await?;
        debug!("Sent photo {} to {}", sent.message_id, chat_id);
        Ok(sent)
    }

    /// Point the bot's webhook at `url`, optionally with a secret token that
    /// Telegram echoes back in `X-Telegram-Bot-Api-Secret-Token`.
    #[instrument(skip(self, secret_token))]
    pub async fn set_webhook(
        &self,
        url: &str,
        secret_token: Option<&str>,
    ) -> Result<(), TelegramError> {
        let request = SetWebhookRequest {
            url: url.to_string(),
            secret_token: secret_token.filter(|s| !s.is_empty()).map(String::from),
        };

        let _: bool = self.call("setWebhook", &request).await?;
        debug!("Webhook set to {}", url);
        Ok(())
    }
}
