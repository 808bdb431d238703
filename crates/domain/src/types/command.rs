//! Commands and command results

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::impl_wire_name_conversions;

/// A command pushed by the server. Read-only on the extension side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: String,
    /// Raw wire type; see [`Command::kind`] for the parsed form.
    #[serde(rename = "type")]
    pub command_type: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl Command {
    pub fn new(id: impl Into<String>, command_type: impl Into<String>, params: Value) -> Self {
        Self {
            id: id.into(),
            command_type: command_type.into(),
            params,
            tab_id: None,
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn with_tab_id(mut self, tab_id: i64) -> Self {
        self.tab_id = Some(tab_id);
        self
    }

    /// Parsed routing kind, `None` for types this build does not know.
    pub fn kind(&self) -> Option<CommandKind> {
        CommandKind::from_str(&self.command_type).ok()
    }
}

/// Known command types.
///
/// Pilot actions drive the page and are gated by the AI Web Pilot toggle.
/// Observation queries only read page state and are never gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKind {
    BrowserAction,
    DomAction,
    Execute,
    Highlight,
    Subtitle,
    Dom,
    A11y,
    PageInfo,
    Tabs,
    Waterfall,
    Screenshot,
}

impl_wire_name_conversions!(CommandKind {
    BrowserAction => "browser_action",
    DomAction => "dom_action",
    Execute => "execute",
    Highlight => "highlight",
    Subtitle => "subtitle",
    Dom => "dom",
    A11y => "a11y",
    PageInfo => "page_info",
    Tabs => "tabs",
    Waterfall => "waterfall",
    Screenshot => "screenshot",
});

impl CommandKind {
    /// Whether this kind needs the pilot toggle enabled
    pub fn requires_pilot(&self) -> bool {
        matches!(
            self,
            CommandKind::BrowserAction
                | CommandKind::DomAction
                | CommandKind::Execute
                | CommandKind::Highlight
                | CommandKind::Subtitle
        )
    }
}

/// Outcome status of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Complete,
    Error,
    Timeout,
}

impl_wire_name_conversions!(CommandStatus {
    Complete => "complete",
    Error => "error",
    Timeout => "timeout",
});

/// Result of one command, produced exactly once per dispatched command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub status: CommandStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    pub fn complete(command: &Command, result: Value) -> Self {
        Self {
            id: command.id.clone(),
            correlation_id: command.correlation_id.clone(),
            status: CommandStatus::Complete,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(command: &Command, error: impl Into<String>, result: Option<Value>) -> Self {
        Self {
            id: command.id.clone(),
            correlation_id: command.correlation_id.clone(),
            status: CommandStatus::Error,
            result,
            error: Some(error.into()),
        }
    }

    pub fn timeout(command: &Command, error: impl Into<String>) -> Self {
        Self {
            id: command.id.clone(),
            correlation_id: command.correlation_id.clone(),
            status: CommandStatus::Timeout,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == CommandStatus::Complete
    }
}
