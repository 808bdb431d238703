//! Shared state of one background process

use std::sync::Arc;

use gasoline_domain::constants::{PILOT_FEATURE, PILOT_FLAG_KEY};

use super::flag::{feature_flag, FeatureFlagCache, FeatureFlagWriter};
use super::processing::ProcessingSet;
use super::results::PendingResultQueue;
use crate::storage_ports::KeyValueStore;

/// State shared by the sync loop and the dispatcher.
///
/// Built fresh per sync client, so tests never inherit state from a previous
/// run.
#[derive(Debug)]
pub struct BackgroundContext {
    pub results: PendingResultQueue,
    pub processing: ProcessingSet,
    pub pilot: FeatureFlagCache,
}

impl BackgroundContext {
    /// Build the context and hand back the pilot flag's single writer.
    pub fn new(store: Arc<dyn KeyValueStore>) -> (Arc<Self>, FeatureFlagWriter) {
        let (writer, pilot) = feature_flag(PILOT_FEATURE, PILOT_FLAG_KEY, store);
        let context = Arc::new(Self {
            results: PendingResultQueue::new(),
            processing: ProcessingSet::new(),
            pilot,
        });
        (context, writer)
    }
}
