//! The background sync loop
//!
//! [`SyncClient`] owns one poll loop against the dev server. Each cycle
//! reports settings, relays buffered telemetry and pending command results,
//! and dispatches the commands the server hands back. The loop runs behind a
//! circuit breaker so a stopped server costs one cheap rejection per cycle.

pub mod client;
pub mod errors;

pub use client::{StartOutcome, StopOutcome, SyncClient, SyncClientConfig, SyncDeps};
pub use errors::{SyncClientError, SyncClientResult};
