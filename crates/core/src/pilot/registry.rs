//! Routing table from command kind to handler

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use gasoline_domain::CommandKind;

use super::handler::CommandHandler;

/// Maps each [`CommandKind`] to at most one handler.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<CommandKind, Arc<dyn CommandHandler>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry").field("kinds", &self.registered_kinds()).finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for `kind`.
    pub fn register(&mut self, kind: CommandKind, handler: Arc<dyn CommandHandler>) -> &mut Self {
        self.handlers.insert(kind, handler);
        self
    }

    /// Builder form of [`HandlerRegistry::register`]
    pub fn with(mut self, kind: CommandKind, handler: Arc<dyn CommandHandler>) -> Self {
        self.register(kind, handler);
        self
    }

    pub fn get(&self, kind: CommandKind) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// Registered kinds, in declaration order
    pub fn registered_kinds(&self) -> Vec<CommandKind> {
        CommandKind::ALL.iter().copied().filter(|k| self.handlers.contains_key(k)).collect()
    }

    /// Known kinds with no handler; commands of these kinds are answered with
    /// `unknown_action`.
    pub fn missing_kinds(&self) -> Vec<CommandKind> {
        CommandKind::ALL.iter().copied().filter(|k| !self.handlers.contains_key(k)).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
