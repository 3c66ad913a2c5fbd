//! Trigger → handler mapping and its extension point.

use super::CommandHandler;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ordered mapping from trigger text to handler.
///
/// Lookup is by exact string equality. Order only matters for listing the
/// triggers; replacing a trigger keeps its original position.
#[derive(Clone, Default)]
pub struct CommandSet {
    entries: Vec<(String, Arc<dyn CommandHandler>)>,
}

impl CommandSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Bind `trigger` to `handler`, returning the handler it replaced.
    pub fn insert(
        &mut self,
        trigger: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Option<Arc<dyn CommandHandler>> {
        let trigger = trigger.into();
        match self.entries.iter().position(|(t, _)| *t == trigger) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].1, handler)),
            None => {
                self.entries.push((trigger, handler));
                None
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, trigger: impl Into<String>, handler: Arc<dyn CommandHandler>) -> Self {
        self.insert(trigger, handler);
        self
    }

    /// Remove a trigger.
    pub fn remove(&mut self, trigger: &str) -> Option<Arc<dyn CommandHandler>> {
        let index = self.entries.iter().position(|(t, _)| t == trigger)?;
        Some(self.entries.remove(index).1)
    }

    /// Handler bound to exactly `trigger`.
    pub fn get(&self, trigger: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.entries
            .iter()
            .find(|(t, _)| t == trigger)
            .map(|(_, handler)| handler)
    }

    pub fn contains(&self, trigger: &str) -> bool {
        self.get(trigger).is_some()
    }

    /// Triggers in registration order.
    pub fn triggers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn CommandHandler>)> {
        self.entries.iter().map(|(t, h)| (t.as_str(), h))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CommandSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.triggers()).finish()
    }
}

/// Extension point for contributing commands.
///
/// The extension sees the full current mapping and returns the mapping it
/// wants to become current: it may add, override or drop triggers. `None`
/// leaves the mapping unchanged.
pub trait CommandExtension: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    fn register_commands(&self, commands: &CommandSet) -> Option<CommandSet>;
}

/// Assembles the command set used for one dispatch.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    extensions: Vec<Arc<dyn CommandExtension>>,
}

impl CommandRegistry {
    pub fn new(extensions: Vec<Arc<dyn CommandExtension>>) -> Self {
        Self { extensions }
    }

    /// Number of registered extensions.
    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    /// Merge the built-in commands with every extension, in order.
    ///
    /// Never fails and never runs a handler. An extension that returns
    /// nothing or an empty mapping is skipped.
    pub fn resolve(&self, builtin: CommandSet) -> CommandSet {
        let mut current = builtin;

        for extension in &self.extensions {
            let Some(next) = extension.register_commands(&current) else {
                debug!(extension = extension.name(), "Extension left commands unchanged");
                continue;
            };

            if next.is_empty() {
                warn!(
                    extension = extension.name(),
                    "Extension returned no commands; keeping the previous set"
                );
                continue;
            }

            report_overrides(extension.name(), &current, &next);
            current = next;
        }

        current
    }
}

/// Log every trigger whose handler changed. Resolution is unaffected.
fn report_overrides(extension: &str, previous: &CommandSet, next: &CommandSet) {
    for (trigger, handler) in next.iter() {
        if let Some(old) = previous.get(trigger) {
            if !same_handler(old, handler) {
                warn!(
                    trigger,
                    extension,
                    replaced = old.name(),
                    replacement = handler.name(),
                    "Command trigger overridden"
                );
            }
        }
    }
}

fn same_handler(a: &Arc<dyn CommandHandler>, b: &Arc<dyn CommandHandler>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct MockHandler {
        name: String,
    }

    #[async_trait]
    impl CommandHandler for MockHandler {
        fn name(&self) -> &str {
            &self.name
        }

        async fn execute(&self, _chat_id: i64, _user_id: i64, _display_name: &str) {}
    }

    fn handler(name: &str) -> Arc<dyn CommandHandler> {
        Arc::new(MockHandler { name: name.into() })
    }

    struct AddPing;

    impl CommandExtension for AddPing {
        fn name(&self) -> &str {
            "add-ping"
        }

        fn register_commands(&self, commands: &CommandSet) -> Option<CommandSet> {
            Some(commands.clone().with("ping", handler("ping")))
        }
    }

    struct Override(&'static str);

    impl CommandExtension for Override {
        fn name(&self) -> &str {
            "override"
        }

        fn register_commands(&self, commands: &CommandSet) -> Option<CommandSet> {
            Some(commands.clone().with(self.0, handler("override")))
        }
    }

    struct Unusable(Option<CommandSet>);

    impl CommandExtension for Unusable {
        fn name(&self) -> &str {
            "unusable"
        }

        fn register_commands(&self, _commands: &CommandSet) -> Option<CommandSet> {
            self.0.clone()
        }
    }

    fn builtin() -> CommandSet {
        CommandSet::new()
            .with("/start", handler("start"))
            .with("register", handler("register"))
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut set = builtin();
        let old = set.insert("/start", handler("new-start"));

        assert_eq!(old.unwrap().name(), "start");
        assert_eq!(set.triggers().collect::<Vec<_>>(), vec!["/start", "register"]);
        assert_eq!(set.get("/start").unwrap().name(), "new-start");
    }

    #[test]
    fn test_exact_lookup() {
        let set = builtin();
        assert!(set.contains("/start"));
        assert!(!set.contains("/START"));
        assert!(!set.contains(" /start"));
        assert!(!set.contains("/start "));
    }

    #[test]
    fn test_remove() {
        let mut set = builtin();
        assert!(set.remove("/start").is_some());
        assert!(set.remove("/start").is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_resolve_without_extensions() {
        let registry = CommandRegistry::default();
        let resolved = registry.resolve(builtin());
        assert_eq!(resolved.triggers().collect::<Vec<_>>(), vec!["/start", "register"]);
    }

    #[test]
    fn test_resolve_adds_trigger() {
        let registry = CommandRegistry::new(vec![Arc::new(AddPing)]);
        let resolved = registry.resolve(builtin());
        assert_eq!(
            resolved.triggers().collect::<Vec<_>>(),
            vec!["/start", "register", "ping"]
        );
    }

    #[test]
    fn test_resolve_last_write_wins() {
        let registry = CommandRegistry::new(vec![
            Arc::new(Override("/start")),
            Arc::new(AddPing),
        ]);
        let resolved = registry.resolve(builtin());

        assert_eq!(resolved.get("/start").unwrap().name(), "override");
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn test_resolve_skips_unusable_results() {
        let registry = CommandRegistry::new(vec![
            Arc::new(Unusable(None)),
            Arc::new(Unusable(Some(CommandSet::new()))),
        ]);
        let resolved = registry.resolve(builtin());
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved.get("register").unwrap().name(), "register");
    }

    #[test]
    fn test_extension_may_drop_builtins() {
        let replacement = CommandSet::new().with("only", handler("only"));
        let registry = CommandRegistry::new(vec![Arc::new(Unusable(Some(replacement)))]);
        let resolved = registry.resolve(builtin());
        assert_eq!(resolved.triggers().collect::<Vec<_>>(), vec!["only"]);
    }

    #[test]
    fn test_debug_lists_triggers() {
        assert_eq!(format!("{:?}", builtin()), r#"["/start", "register"]"#);
    }
}
