//! Protocol constants
//!
//! Wire names and defaults shared by the sync client and the dev server.

// Server contract
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:7890";
pub const SYNC_PATH: &str = "/sync";
pub const CLIENT_HEADER: &str = "X-Gasoline-Client";
pub const EXTENSION_VERSION_HEADER: &str = "X-Gasoline-Extension-Version";
pub const CLIENT_NAME: &str = "gasoline-extension";
pub const EXTENSION_VERSION: &str = env!("CARGO_PKG_VERSION");

// Poll cadence
pub const DEFAULT_POLL_MS: u64 = 1_000;
pub const MIN_POLL_MS: u64 = 100;
pub const MAX_POLL_MS: u64 = 30_000;
pub const ERROR_POLL_MS: u64 = 2_000;
pub const FLAG_WAIT_TIMEOUT_MS: u64 = 300;
pub const STOP_TIMEOUT_MS: u64 = 5_000;
pub const REQUEST_TIMEOUT_MS: u64 = 10_000;

// Circuit breaker
pub const BREAKER_MAX_FAILURES: u64 = 5;
pub const BREAKER_RESET_TIMEOUT_MS: u64 = 30_000;
pub const BREAKER_INITIAL_BACKOFF_MS: u64 = 1_000;
pub const BREAKER_MAX_BACKOFF_MS: u64 = 30_000;

/// Failure counters shown to the user stop growing here.
pub const MAX_REPORTED_FAILURES: u32 = 999;

// Pilot
pub const PILOT_FEATURE: &str = "ai_web_pilot";
pub const PILOT_FLAG_KEY: &str = "ai_web_pilot_enabled";
pub const HANDLER_TIMEOUT_MS: u64 = 30_000;
pub const CONTEXT_TIMEOUT_MS: u64 = 10_000;

// Result error codes
pub const PILOT_DISABLED_ERROR: &str = "ai_web_pilot_disabled";
pub const UNKNOWN_ACTION_ERROR: &str = "unknown_action";
pub const HANDLER_TIMEOUT_ERROR: &str = "handler_timeout";
pub const HANDLER_PANICKED_ERROR: &str = "handler_panicked";
pub const HANDLER_FAILED_ERROR: &str = "handler_failed";

// Telemetry
pub const TELEMETRY_BUFFER_CAPACITY: usize = 1_000;
pub const MAX_LOGS_PER_SYNC: usize = 200;
pub const BACKGROUND_LOG_SOURCE: &str = "background";
