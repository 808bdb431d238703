//! Connection status surfaced to the popup

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_REPORTED_FAILURES;

/// Connectivity as seen by the sync loop after its latest cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub consecutive_failures: u32,
    pub total_failures: u32,
    pub last_error: Option<String>,
    pub breaker_state: String,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub server_version: Option<String>,
    pub pending_results: usize,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self {
            connected: false,
            consecutive_failures: 0,
            total_failures: 0,
            last_error: None,
            breaker_state: "closed".to_string(),
            last_sync_at: None,
            server_version: None,
            pending_results: 0,
        }
    }
}

impl ConnectionStatus {
    /// Record a successful cycle
    pub fn mark_connected(&mut self, at: DateTime<Utc>, server_version: Option<String>) {
        self.connected = true;
        self.consecutive_failures = 0;
        self.last_error = None;
        self.last_sync_at = Some(at);
        if server_version.is_some() {
            self.server_version = server_version;
        }
    }

    /// Record a failed cycle; counters saturate at [`MAX_REPORTED_FAILURES`].
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.connected = false;
        self.consecutive_failures = (self.consecutive_failures + 1).min(MAX_REPORTED_FAILURES);
        self.total_failures = (self.total_failures + 1).min(MAX_REPORTED_FAILURES);
        self.last_error = Some(error.into());
    }
}
