//! Port interfaces for the sync loop
//!
//! These traits define the boundaries between the poll loop and the
//! transport, telemetry producers and settings owners it talks to.

use async_trait::async_trait;
use gasoline_domain::{CaptureSettings, ExtensionLog, Result, SyncRequest, SyncResponse};

/// Trait for exchanging one sync payload with the server
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Send the request and decode the server's reply
    async fn sync(&self, request: &SyncRequest) -> Result<SyncResponse>;
}

/// Snapshot of buffered telemetry taken for one send
///
/// The source keeps every entry until the batch is confirmed, so a send that
/// fails or is skipped by the breaker loses nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryBatch {
    logs: Vec<ExtensionLog>,
    high_water: Option<u64>,
    drops_through: u64,
}

impl TelemetryBatch {
    /// `high_water` is the newest source sequence number in `logs`;
    /// `drops_through` is the drop total the batch already reports.
    pub fn new(logs: Vec<ExtensionLog>, high_water: Option<u64>, drops_through: u64) -> Self {
        Self { logs, high_water, drops_through }
    }

    pub fn logs(&self) -> &[ExtensionLog] {
        &self.logs
    }

    pub fn high_water(&self) -> Option<u64> {
        self.high_water
    }

    pub fn drops_through(&self) -> u64 {
        self.drops_through
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

/// Trait for buffered telemetry that rides along with each cycle
pub trait TelemetrySource: Send + Sync {
    /// Snapshot up to `max` buffered entries, oldest first, without removing them
    fn peek_logs(&self, max: usize) -> TelemetryBatch;

    /// Remove the entries of a batch the server accepted. Returns how many
    /// were still buffered.
    fn confirm_logs(&self, batch: &TelemetryBatch) -> usize;

    /// Entries currently buffered
    fn pending(&self) -> usize;
}

/// Trait for the owner of capture and tracking settings
pub trait SettingsProvider: Send + Sync {
    /// Current snapshot of the capture settings
    fn capture_settings(&self) -> CaptureSettings;
}
