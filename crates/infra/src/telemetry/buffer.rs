//! Bounded telemetry ring

use gasoline_common::RingBuffer;
use gasoline_core::{TelemetryBatch, TelemetrySource};
use gasoline_domain::constants::BACKGROUND_LOG_SOURCE;
use gasoline_domain::{ExtensionLog, LogLevel};
use parking_lot::Mutex;

/// Oldest entries are dropped once `capacity` is reached.
///
/// Entries leave the ring only when a batch carrying them is confirmed.
/// Batches taken after a drop lead with a `warn` entry counting the entries
/// lost since the last confirmed report.
#[derive(Debug)]
pub struct TelemetryBuffer {
    inner: Mutex<BufferState>,
}

#[derive(Debug)]
struct BufferState {
    ring: RingBuffer<(u64, ExtensionLog)>,
    next_seq: u64,
    reported_drops: u64,
}

impl TelemetryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BufferState {
                ring: RingBuffer::new(capacity),
                next_seq: 0,
                reported_drops: 0,
            }),
        }
    }

    pub fn push(&self, log: ExtensionLog) {
        let mut st = self.inner.lock();
        let seq = st.next_seq;
        st.next_seq += 1;
        st.ring.push((seq, log));
    }

    /// Total entries dropped since creation
    pub fn dropped(&self) -> u64 {
        self.inner.lock().ring.evicted()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().ring.capacity()
    }
}

impl TelemetrySource for TelemetryBuffer {
    fn peek_logs(&self, max: usize) -> TelemetryBatch {
        let st = self.inner.lock();
        let evicted = st.ring.evicted();
        if max == 0 {
            return TelemetryBatch::new(Vec::new(), None, st.reported_drops);
        }

        let unreported = evicted - st.reported_drops;
        let mut logs = Vec::with_capacity(max.min(st.ring.len() + 1));
        if unreported > 0 {
            logs.push(ExtensionLog::new(
                LogLevel::Warn,
                BACKGROUND_LOG_SOURCE,
                "telemetry",
                format!("{unreported} log entries dropped, buffer full"),
            ));
        }

        let room = max - logs.len();
        let mut high_water = None;
        for (seq, log) in st.ring.iter().take(room) {
            high_water = Some(*seq);
            logs.push(log.clone());
        }
        TelemetryBatch::new(logs, high_water, evicted)
    }

    fn confirm_logs(&self, batch: &TelemetryBatch) -> usize {
        let mut st = self.inner.lock();
        st.reported_drops = st.reported_drops.max(batch.drops_through());
        let Some(high_water) = batch.high_water() else {
            return 0;
        };

        let mut removed = 0;
        while st.ring.iter().next().is_some_and(|(seq, _)| *seq <= high_water) {
            st.ring.pop();
            removed += 1;
        }
        removed
    }

    fn pending(&self) -> usize {
        self.inner.lock().ring.len()
    }
}
