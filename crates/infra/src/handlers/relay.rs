//! Forwards a command to the context that can execute it

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use gasoline_core::{CommandHandler, ContextMessenger, HandlerError, HandlerOutcome};
use gasoline_domain::Command;
use serde_json::{json, Value};
use tracing::{debug, instrument};

/// Sends `{type, params, tab_id}` to a target context and interprets the
/// `{success, result, error}` reply.
///
/// Commands that name a tab are addressed to `<target>:<tab_id>`.
pub struct RelayHandler {
    messenger: Arc<dyn ContextMessenger>,
    target: String,
}

impl fmt::Debug for RelayHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayHandler").field("target", &self.target).finish()
    }
}

impl RelayHandler {
    pub fn new(messenger: Arc<dyn ContextMessenger>, target: impl Into<String>) -> Self {
        Self { messenger, target: target.into() }
    }

    fn address(&self, command: &Command) -> String {
        match command.tab_id {
            Some(tab_id) => format!("{}:{tab_id}", self.target),
            None => self.target.clone(),
        }
    }
}

fn envelope(command: &Command) -> Value {
    json!({
        "type": command.command_type,
        "params": command.params,
        "tab_id": command.tab_id,
    })
}

#[async_trait]
impl CommandHandler for RelayHandler {
    #[instrument(skip_all, fields(command_id = %command.id, command_type = %command.command_type))]
    async fn handle(&self, command: &Command) -> Result<HandlerOutcome, HandlerError> {
        let address = self.address(command);
        let reply = self.messenger.send(&address, envelope(command)).await?;
        debug!(%address, "relay reply received");
        Ok(HandlerOutcome::from_reply(reply))
    }
}
