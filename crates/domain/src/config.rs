//! Configuration structures
//!
//! Every field has a default so a partial TOML/JSON file (or none at all) is
//! a valid configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::types::CaptureSettings;
use crate::{GasolineError, Result};

/// Top-level agent configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sync: SyncConfig,
    pub breaker: BreakerConfig,
    pub pilot: PilotConfig,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
    pub capture: CaptureSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub url: String,
    pub request_timeout_ms: u64,
    pub extension_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            request_timeout_ms: REQUEST_TIMEOUT_MS,
            extension_version: EXTENSION_VERSION.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Poll cadence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub default_poll_ms: u64,
    pub min_poll_ms: u64,
    pub max_poll_ms: u64,
    pub error_poll_ms: u64,
    pub flag_wait_timeout_ms: u64,
    pub stop_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_poll_ms: DEFAULT_POLL_MS,
            min_poll_ms: MIN_POLL_MS,
            max_poll_ms: MAX_POLL_MS,
            error_poll_ms: ERROR_POLL_MS,
            flag_wait_timeout_ms: FLAG_WAIT_TIMEOUT_MS,
            stop_timeout_ms: STOP_TIMEOUT_MS,
        }
    }
}

impl SyncConfig {
    /// Delay before the next cycle given the server's hint.
    ///
    /// `0` means "no opinion" and maps to the default interval; anything else
    /// is clamped into `[min_poll_ms, max_poll_ms]`.
    pub fn next_poll(&self, hint_ms: u64) -> Duration {
        let ms = if hint_ms == 0 {
            self.default_poll_ms
        } else {
            hint_ms.clamp(self.min_poll_ms, self.max_poll_ms)
        };
        Duration::from_millis(ms)
    }

    pub fn error_poll(&self) -> Duration {
        Duration::from_millis(self.error_poll_ms)
    }

    pub fn flag_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.flag_wait_timeout_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Circuit breaker tuning for the sync transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    pub max_failures: u64,
    pub reset_timeout_ms: u64,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: BREAKER_MAX_FAILURES,
            reset_timeout_ms: BREAKER_RESET_TIMEOUT_MS,
            initial_backoff_ms: BREAKER_INITIAL_BACKOFF_MS,
            max_backoff_ms: BREAKER_MAX_BACKOFF_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PilotConfig {
    /// Upper bound on a single handler invocation
    pub handler_timeout_ms: u64,
    /// Upper bound on one cross-context request
    pub context_timeout_ms: u64,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self { handler_timeout_ms: HANDLER_TIMEOUT_MS, context_timeout_ms: CONTEXT_TIMEOUT_MS }
    }
}

impl PilotConfig {
    pub fn handler_timeout(&self) -> Duration {
        Duration::from_millis(self.handler_timeout_ms)
    }

    pub fn context_timeout(&self) -> Duration {
        Duration::from_millis(self.context_timeout_ms)
    }
}

/// Persistent key-value storage. No path means in-memory only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub buffer_capacity: usize,
    pub max_logs_per_sync: usize,
    /// Minimum level of the agent's own tracing events relayed to the server
    pub capture_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: TELEMETRY_BUFFER_CAPACITY,
            max_logs_per_sync: MAX_LOGS_PER_SYNC,
            capture_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

impl Config {
    /// Reject configurations the sync loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server.url.trim().is_empty() {
            return Err(GasolineError::Config("server.url must not be empty".into()));
        }
        if self.server.request_timeout_ms == 0 {
            return Err(GasolineError::Config("server.request_timeout_ms must be > 0".into()));
        }
        if self.sync.min_poll_ms == 0 || self.sync.default_poll_ms == 0 {
            return Err(GasolineError::Config("sync poll intervals must be > 0".into()));
        }
        if self.sync.min_poll_ms > self.sync.max_poll_ms {
            return Err(GasolineError::Config(format!(
                "sync.min_poll_ms ({}) exceeds sync.max_poll_ms ({})",
                self.sync.min_poll_ms, self.sync.max_poll_ms
            )));
        }
        if self.breaker.max_failures == 0 {
            return Err(GasolineError::Config("breaker.max_failures must be > 0".into()));
        }
        if self.breaker.initial_backoff_ms > self.breaker.max_backoff_ms {
            return Err(GasolineError::Config(
                "breaker.initial_backoff_ms exceeds breaker.max_backoff_ms".into(),
            ));
        }
        if self.pilot.handler_timeout_ms == 0 {
            return Err(GasolineError::Config("pilot.handler_timeout_ms must be > 0".into()));
        }
        if self.telemetry.buffer_capacity == 0 {
            return Err(GasolineError::Config("telemetry.buffer_capacity must be > 0".into()));
        }
        Ok(())
    }
}
