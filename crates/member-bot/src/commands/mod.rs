//! Bot command handlers and dispatch.
//!
//! Every command, built-in or contributed by an extension, implements
//! [`CommandHandler`] with the same `(chat_id, user_id, display_name)`
//! arguments. The [`Dispatcher`] resolves a fresh [`CommandSet`] for each
//! message and either runs the matching handler or the fallback chain.

mod balance;
mod dispatcher;
mod member_card;
mod register;
mod registry;
mod self_test;
mod start;

pub use balance::BalanceHandler;
pub use dispatcher::{fallback_message, Dispatcher, UnknownCommandObserver};
pub use member_card::MemberCardHandler;
pub use register::RegisterHandler;
pub use registry::{CommandExtension, CommandRegistry, CommandSet};
pub use self_test::SelfTestHandler;
pub use start::StartHandler;

use crate::config::BotConfig;
use crate::delivery::Delivery;
use crate::members::MemberDirectory;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Command handler trait.
///
/// Handlers are total: they turn their own collaborator failures into a
/// reply and never report an error back to the dispatcher.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Execute the command.
    async fn execute(&self, chat_id: i64, user_id: i64, display_name: &str);
}

/// Reply for commands that need a registered member.
pub(crate) fn not_registered_message(register_trigger: &str) -> String {
    format!("您尚未註冊，請先輸入「{}」。", register_trigger)
}

/// Generic reply when a collaborator fails.
pub(crate) const GENERIC_FAILURE_MESSAGE: &str = "系統發生錯誤，請聯絡管理員。";

/// Build the built-in command set in its fixed order.
pub fn builtin_commands(
    delivery: Arc<dyn Delivery>,
    members: Arc<dyn MemberDirectory>,
    bot: &BotConfig,
) -> CommandSet {
    let triggers = &bot.triggers;
    let mut commands = CommandSet::new();

    add_builtin(
        &mut commands,
        &triggers.start,
        Arc::new(StartHandler::new(delivery.clone(), triggers.clone())),
    );
    add_builtin(
        &mut commands,
        &triggers.register,
        Arc::new(RegisterHandler::new(delivery.clone(), members.clone())),
    );
    add_builtin(
        &mut commands,
        &triggers.balance,
        Arc::new(BalanceHandler::new(
            delivery.clone(),
            members.clone(),
            triggers.register.clone(),
        )),
    );
    add_builtin(
        &mut commands,
        &triggers.member_card,
        Arc::new(MemberCardHandler::new(
            delivery.clone(),
            members,
            bot.qr_service_url.clone(),
            triggers.register.clone(),
        )),
    );
    add_builtin(
        &mut commands,
        &triggers.self_test,
        Arc::new(SelfTestHandler::new(delivery)),
    );

    commands
}

fn add_builtin(commands: &mut CommandSet, trigger: &str, handler: Arc<dyn CommandHandler>) {
    if commands.insert(trigger, handler).is_some() {
        warn!(trigger, "Built-in trigger configured twice; the later command wins");
    }
}
