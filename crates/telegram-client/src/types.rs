//! Telegram Bot API types.

use serde::{Deserialize, Serialize};

/// Incoming webhook update.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    #[serde(default)]
    pub date: i64,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

/// Envelope returned by every Bot API method.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

/// Custom reply keyboard shown under the input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
    pub one_time_keyboard: bool,
}

impl ReplyKeyboardMarkup {
    /// Build a persistent, resized keyboard from rows of button labels.
    pub fn from_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keyboard: rows
                .into_iter()
                .map(|row| row.into_iter().map(KeyboardButton::new).collect())
                .collect(),
            resize_keyboard: true,
            one_time_keyboard: false,
        }
    }

    /// All button labels, row by row.
    pub fn labels(&self) -> Vec<&str> {
        self.keyboard
            .iter()
            .flatten()
            .map(|b| b.text.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

impl KeyboardButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// `sendMessage` request body.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyKeyboardMarkup>,
}

/// `sendPhoto` request body.
#[derive(Debug, Clone, Serialize)]
pub struct SendPhotoRequest {
    pub chat_id: i64,
    pub photo: String,
    pub caption: String,
}

/// `setWebhook` request body.
#[derive(Debug, Clone, Serialize)]
pub struct SetWebhookRequest {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<String>,
}

/// Parsed and sanitized message for bot processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotMessage {
    /// Chat the reply goes to.
    pub chat_id: i64,
    /// Telegram id of the sender.
    pub user_id: i64,
    /// Message text with tags stripped and whitespace collapsed.
    pub text: String,
    /// Sender's first name, or "User" when absent.
    pub display_name: String,
}

/// Fallback display name for senders without a first name.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

impl BotMessage {
    /// Extract a bot message from a webhook update.
    ///
    /// Returns `None` unless the update carries a text message with both a
    /// chat and a sender.
    pub fn from_update(update: &Update) -> Option<Self> {
        let message = update.message.as_ref()?;
        let text = message.text.as_deref()?;
        let from = message.from.as_ref()?;

        let display_name = from
            .first_name
            .as_deref()
            .map(sanitize_text)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

        Some(Self {
            chat_id: message.chat.id,
            user_id: from.id,
            text: sanitize_text(text),
            display_name,
        })
    }
}

/// Strip markup from untrusted text and collapse whitespace.
///
/// Anything that looks like a tag (`<` followed by a letter, `/` or `!`, up
/// to the closing `>`) is removed. Line breaks, tabs and runs of spaces
/// become a single space, and the result is trimmed.
pub fn sanitize_text(input: &str) -> String {
    let mut stripped = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '<' {
            let opens_tag = chars
                .peek()
                .is_some_and(|next| next.is_ascii_alphabetic() || *next == '/' || *next == '!');
            if opens_tag {
                for inner in chars.by_ref() {
                    if inner == '>' {
                        break;
                    }
                }
                continue;
            }
        }
        stripped.push(c);
    }

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape text for messages sent with `parse_mode: HTML`.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: serde_json::Value) -> Update {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_bot_message_from_update() {
        let update = update(serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "date": 1700000000,
                "chat": { "id": 555, "type": "private" },
                "from": { "id": 42, "is_bot": false, "first_name": "Ada" },
                "text": "/start"
            }
        }));

        let msg = BotMessage::from_update(&update).unwrap();
        assert_eq!(msg.chat_id, 555);
        assert_eq!(msg.user_id, 42);
        assert_eq!(msg.text, "/start");
        assert_eq!(msg.display_name, "Ada");
    }

    #[test]
    fn test_bot_message_defaults_display_name() {
        let update = update(serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "chat": { "id": 555 },
                "from": { "id": 42 },
                "text": "hi"
            }
        }));

        let msg = BotMessage::from_update(&update).unwrap();
        assert_eq!(msg.display_name, DEFAULT_DISPLAY_NAME);
    }

    #[test]
    fn test_bot_message_requires_text_and_sender() {
        let no_text = update(serde_json::json!({
            "update_id": 1,
            "message": { "message_id": 1, "chat": { "id": 1 }, "from": { "id": 2 } }
        }));
        assert!(BotMessage::from_update(&no_text).is_none());

        let no_from = update(serde_json::json!({
            "update_id": 1,
            "message": { "message_id": 1, "chat": { "id": 1 }, "text": "hi" }
        }));
        assert!(BotMessage::from_update(&no_from).is_none());

        let no_message = update(serde_json::json!({ "update_id": 1 }));
        assert!(BotMessage::from_update(&no_message).is_none());
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("  註冊 \n"), "註冊");
        assert_eq!(sanitize_text("<b>bold</b> text"), "bold text");
        assert_eq!(sanitize_text("a\t\tb\r\nc"), "a b c");
        assert_eq!(sanitize_text("1 < 2"), "1 < 2");
        assert_eq!(sanitize_text("<script>x</script>"), "x");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<Ada & \"Bob\">"), "&lt;Ada &amp; &quot;Bob&quot;&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_keyboard_from_rows() {
        let keyboard = ReplyKeyboardMarkup::from_rows(vec![vec!["a", "b"], vec!["c"]]);
        assert_eq!(keyboard.labels(), vec!["a", "b", "c"]);
        assert!(keyboard.resize_keyboard);
        assert!(!keyboard.one_time_keyboard);

        let json = serde_json::to_value(&keyboard).unwrap();
        assert_eq!(json["keyboard"][0][1]["text"], "b");
    }
}
