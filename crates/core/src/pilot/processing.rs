//! Commands currently being handled

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

/// Set of command ids with a handler in flight.
///
/// An id enters through [`ProcessingSet::try_begin`] and leaves when the
/// returned guard is dropped, so every exit path of a dispatch clears it.
#[derive(Debug, Clone, Default)]
pub struct ProcessingSet {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl ProcessingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`; `None` if another dispatch already holds it.
    pub fn try_begin(&self, id: &str) -> Option<ProcessingGuard> {
        let mut ids = self.ids.lock();
        if !ids.insert(id.to_string()) {
            return None;
        }
        Some(ProcessingGuard { set: self.clone(), id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.lock().is_empty()
    }
}

/// Membership of one id in a [`ProcessingSet`]; removes it on drop.
#[derive(Debug)]
pub struct ProcessingGuard {
    set: ProcessingSet,
    id: String,
}

impl ProcessingGuard {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.set.ids.lock().remove(&self.id);
    }
}
