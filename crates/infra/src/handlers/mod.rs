//! Command handlers backed by cross-context messaging

pub mod relay;

use std::sync::Arc;

use gasoline_core::{ContextMessenger, HandlerRegistry, WithTimeout};
use gasoline_domain::{CommandKind, PilotConfig};

pub use relay::RelayHandler;

/// Context that answers page-bound commands
pub const PAGE_CONTEXT: &str = "page";
/// Context that answers browser-wide queries (tab list, network waterfall)
pub const BROWSER_CONTEXT: &str = "browser";

/// Relay every page and browser command kind through `messenger`, each
/// bounded by `pilot.handler_timeout_ms`.
///
/// `screenshot` is left unregistered: capture needs a native surface this
/// process does not have, so it reports `unknown_action`.
pub fn default_registry(
    messenger: Arc<dyn ContextMessenger>,
    pilot: &PilotConfig,
) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    for kind in CommandKind::ALL {
        let target = match kind {
            CommandKind::Screenshot => continue,
            CommandKind::Tabs | CommandKind::Waterfall => BROWSER_CONTEXT,
            _ => PAGE_CONTEXT,
        };
        let relay = RelayHandler::new(messenger.clone(), target);
        registry.register(*kind, Arc::new(WithTimeout::new(relay, pilot.handler_timeout())));
    }
    registry
}
