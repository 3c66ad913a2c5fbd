//! Routes an incoming message to its handler or the fallback chain.

use super::CommandSet;
use crate::context::AppContext;
use crate::delivery::Delivery;
use async_trait::async_trait;
use std::sync::Arc;
use telegram_client::{escape_html, BotMessage};
use tracing::{debug, info};

/// Extension point for messages that match no trigger.
///
/// Every observer runs, in registration order, before the default fallback
/// reply. Observers may send their own replies; the fallback is still sent.
#[async_trait]
pub trait UnknownCommandObserver: Send + Sync {
    async fn on_unknown_command(
        &self,
        text: &str,
        chat_id: i64,
        user_id: i64,
        delivery: &dyn Delivery,
    );
}

/// Reply listing every available trigger, one per line, escaped for HTML.
pub fn fallback_message(commands: &CommandSet) -> String {
    let listing = commands
        .triggers()
        .map(escape_html)
        .collect::<Vec<_>>()
        .join("\n- ");
    format!("無法識別的指令。請嘗試以下操作：\n\n- {}", listing)
}

/// Command dispatcher.
///
/// Stateless apart from the shared context; the command set is resolved
/// again for every message.
#[derive(Clone)]
pub struct Dispatcher {
    ctx: Arc<AppContext>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Built-in commands merged with every command extension.
    pub fn registry(&self) -> CommandSet {
        self.ctx
            .command_registry()
            .resolve(self.ctx.builtin_commands().clone())
    }

    /// Dispatch one message.
    ///
    /// Exactly one of the matched handler or the default fallback replies
    /// to `chat_id`. Handlers are not retried.
    pub async fn dispatch(&self, message: &BotMessage) {
        let commands = self.registry();

        if let Some(handler) = commands.get(&message.text) {
            info!(
                chat_id = message.chat_id,
                user_id = message.user_id,
                command = handler.name(),
                "Dispatching command"
            );
            handler
                .execute(message.chat_id, message.user_id, &message.display_name)
                .await;
            return;
        }

        debug!(
            chat_id = message.chat_id,
            user_id = message.user_id,
            "No command matched"
        );

        let delivery = self.ctx.delivery();
        for observer in self.ctx.unknown_command_observers() {
            observer
                .on_unknown_command(
                    &message.text,
                    message.chat_id,
                    message.user_id,
                    delivery.as_ref(),
                )
                .await;
        }

        delivery
            .reply(message.chat_id, &fallback_message(&commands), None)
            .await;
    }
}
