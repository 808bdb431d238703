//! Pending command results
//!
//! Results are produced whenever a handler settles, which may be in the middle
//! of a sync send. The queue therefore never clears blindly: a send works on a
//! [`PendingBatch`] snapshot, and only the entries in a batch the server
//! accepted are removed. Anything queued after the snapshot, and everything in
//! a batch whose send failed, stays for the next cycle.

use std::collections::VecDeque;

use gasoline_domain::CommandResult;
use parking_lot::Mutex;
use tracing::debug;

#[derive(Debug, Default)]
struct QueueState {
    entries: VecDeque<(u64, CommandResult)>,
    next_seq: u64,
}

/// Results waiting for delivery to the server
#[derive(Debug, Default)]
pub struct PendingResultQueue {
    inner: Mutex<QueueState>,
}

/// Snapshot of the queue taken for one send
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingBatch {
    results: Vec<CommandResult>,
    high_water: Option<u64>,
}

impl PendingBatch {
    pub fn results(&self) -> &[CommandResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<CommandResult> {
        self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl PendingResultQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result. Safe to call at any time, including mid-send.
    pub fn queue_command_result(&self, result: CommandResult) {
        let mut state = self.inner.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        debug!(command_id = %result.id, status = %result.status, seq, "result queued");
        state.entries.push_back((seq, result));
    }

    /// Snapshot everything queued so far without removing it.
    pub fn drain_for_send(&self) -> PendingBatch {
        let state = self.inner.lock();
        PendingBatch {
            results: state.entries.iter().map(|(_, result)| result.clone()).collect(),
            high_water: state.entries.back().map(|(seq, _)| *seq),
        }
    }

    /// Remove the entries of a delivered batch. Returns how many were removed.
    pub fn confirm_delivered(&self, batch: &PendingBatch) -> usize {
        let Some(high_water) = batch.high_water else {
            return 0;
        };
        let mut state = self.inner.lock();
        let before = state.entries.len();
        state.entries.retain(|(seq, _)| *seq > high_water);
        before - state.entries.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}
