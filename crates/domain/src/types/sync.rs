//! `/sync` payloads
//!
//! One POST per poll cycle carries settings, buffered telemetry and drained
//! command results; the response carries new commands and the next poll hint.
//! Field names are snake_case on the wire.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::command::{Command, CommandResult};

/// Fresh random session identifier for one background-process lifetime.
pub fn new_session_id() -> String {
    format!("ext_{}", Uuid::new_v4().simple())
}

/// Outbound sync payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SyncSettings>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension_logs: Vec<ExtensionLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_command_ack: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command_results: Vec<CommandResult>,
}

/// Settings snapshot reported each cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    pub pilot_enabled: bool,
    pub tracking_enabled: bool,
    pub tracked_tab_id: i64,
    pub tracked_tab_url: String,
    pub tracked_tab_title: String,
    pub capture_logs: bool,
    pub capture_network: bool,
    pub capture_websocket: bool,
    pub capture_actions: bool,
}

impl SyncSettings {
    pub fn new(pilot_enabled: bool, capture: &CaptureSettings) -> Self {
        Self {
            pilot_enabled,
            tracking_enabled: capture.tracking_enabled,
            tracked_tab_id: capture.tracked_tab_id,
            tracked_tab_url: capture.tracked_tab_url.clone(),
            tracked_tab_title: capture.tracked_tab_title.clone(),
            capture_logs: capture.capture_logs,
            capture_network: capture.capture_network,
            capture_websocket: capture.capture_websocket,
            capture_actions: capture.capture_actions,
        }
    }
}

/// Capture and tracking settings owned by the settings provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub tracking_enabled: bool,
    pub tracked_tab_id: i64,
    pub tracked_tab_url: String,
    pub tracked_tab_title: String,
    pub capture_logs: bool,
    pub capture_network: bool,
    pub capture_websocket: bool,
    pub capture_actions: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            tracking_enabled: false,
            tracked_tab_id: 0,
            tracked_tab_url: String::new(),
            tracked_tab_title: String::new(),
            capture_logs: true,
            capture_network: true,
            capture_websocket: false,
            capture_actions: true,
        }
    }
}

/// Severity of a relayed log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Diagnostic entry produced by the extension itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionLog {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub source: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ExtensionLog {
    pub fn new(
        level: LogLevel,
        source: impl Into<String>,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            source: source.into(),
            category: category.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Inbound sync payload. Every field tolerates absence and `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    #[serde(default)]
    pub ack: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub commands: Vec<Command>,
    #[serde(default)]
    pub next_poll_ms: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub server_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_version: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub capture_overrides: HashMap<String, String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
