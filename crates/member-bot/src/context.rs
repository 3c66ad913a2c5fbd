//! Process-wide application context.

use crate::commands::{
    builtin_commands, CommandExtension, CommandRegistry, CommandSet, UnknownCommandObserver,
};
use crate::config::BotConfig;
use crate::delivery::Delivery;
use crate::members::MemberDirectory;
use std::sync::Arc;

/// Extensions registered at startup, in the order they will run.
#[derive(Clone, Default)]
pub struct Extensions {
    commands: Vec<Arc<dyn CommandExtension>>,
    unknown_command_observers: Vec<Arc<dyn UnknownCommandObserver>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command extension. Later extensions see earlier results.
    pub fn with_commands(mut self, extension: impl CommandExtension + 'static) -> Self {
        self.commands.push(Arc::new(extension));
        self
    }

    /// Add an observer for messages that match no trigger.
    pub fn with_unknown_command_observer(
        mut self,
        observer: impl UnknownCommandObserver + 'static,
    ) -> Self {
        self.unknown_command_observers.push(Arc::new(observer));
        self
    }
}

/// Collaborators and extensions shared by every dispatch.
///
/// Built once in `main` and never mutated afterwards.
pub struct AppContext {
    delivery: Arc<dyn Delivery>,
    builtin: CommandSet,
    registry: CommandRegistry,
    observers: Vec<Arc<dyn UnknownCommandObserver>>,
}

impl AppContext {
    pub fn new(
        delivery: Arc<dyn Delivery>,
        members: Arc<dyn MemberDirectory>,
        bot: &BotConfig,
        extensions: Extensions,
    ) -> Self {
        let builtin = builtin_commands(delivery.clone(), members, bot);

        Self {
            delivery,
            builtin,
            registry: CommandRegistry::new(extensions.commands),
            observers: extensions.unknown_command_observers,
        }
    }

    pub fn delivery(&self) -> &Arc<dyn Delivery> {
        &self.delivery
    }

    /// Built-in commands, before extensions are applied.
    pub fn builtin_commands(&self) -> &CommandSet {
        &self.builtin
    }

    pub fn command_registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn unknown_command_observers(&self) -> &[Arc<dyn UnknownCommandObserver>] {
        &self.observers
    }
}
