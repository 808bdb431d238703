//! Watch-backed gate over a value loaded once in the background.
//!
//! Readers see `None` until the [`GateWriter`] publishes the first value;
//! later writes replace it in place.
//!
//! ```
//! use gasoline_common::cache::init_gate;
//!
//! let (writer, gate) = init_gate::<u8>();
//! assert!(!gate.is_initialized());
//! assert!(writer.set_if_unset(7));
//! assert!(!writer.set_if_unset(9));
//! assert_eq!(gate.value(), Some(7));
//! ```

use std::fmt;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

/// Outcome of a bounded wait on an [`InitGate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRead<T> {
    /// The value has been loaded at least once
    Ready(T),
    /// The first load did not finish within the timeout
    Unknown,
}

impl<T> GateRead<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, GateRead::Ready(_))
    }

    pub fn ready(self) -> Option<T> {
        match self {
            GateRead::Ready(value) => Some(value),
            GateRead::Unknown => None,
        }
    }
}

/// Create a gate and its only writer.
pub fn init_gate<T>() -> (GateWriter<T>, InitGate<T>)
where
    T: Clone + Send + Sync + 'static,
{
    let (tx, rx) = watch::channel(None);
    (GateWriter { tx }, InitGate { rx })
}

/// Read side of an asynchronously initialised value. Cheap to clone.
#[derive(Clone)]
pub struct InitGate<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T> fmt::Debug for InitGate<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitGate").field("value", &*self.rx.borrow()).finish()
    }
}

impl<T> InitGate<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Whether the first load has completed
    pub fn is_initialized(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Current value, `None` until initialised
    pub fn value(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    /// Resolves once the gate is initialised. Never resolves if the writer is
    /// dropped before setting a value.
    pub async fn ready(&self) -> T {
        let mut rx = self.rx.clone();
        loop {
            if let Some(value) = rx.borrow_and_update().clone() {
                return value;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Wait for the first load, giving up after `timeout`.
    pub async fn wait_ready(&self, timeout: Duration) -> GateRead<T> {
        if let Some(value) = self.value() {
            return GateRead::Ready(value);
        }
        match tokio::time::timeout(timeout, self.ready()).await {
            Ok(value) => GateRead::Ready(value),
            Err(_) => {
                debug!(timeout_ms = timeout.as_millis() as u64, "init gate still unknown");
                GateRead::Unknown
            }
        }
    }
}

/// Write side of an [`InitGate`]. Deliberately not `Clone`.
pub struct GateWriter<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T> fmt::Debug for GateWriter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateWriter").field("readers", &self.tx.receiver_count()).finish()
    }
}

impl<T> GateWriter<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Set the value synchronously and wake every waiting reader.
    pub fn set(&self, value: T) {
        self.tx.send_replace(Some(value));
    }

    /// Set the value only if the gate has not been initialised yet.
    ///
    /// Returns `true` when this call initialised the gate.
    pub fn set_if_unset(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(value);
            true
        })
    }

    /// A new reader for this gate
    pub fn subscribe(&self) -> InitGate<T> {
        InitGate { rx: self.tx.subscribe() }
    }

    pub fn is_initialized(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uninitialised_gate_reports_unknown() {
        let (_writer, gate) = init_gate::<bool>();
        assert!(!gate.is_initialized());
        assert_eq!(gate.value(), None);
        assert_eq!(gate.wait_ready(Duration::from_millis(10)).await, GateRead::Unknown);
    }

    #[tokio::test]
    async fn test_waiter_wakes_on_set() {
        let (writer, gate) = init_gate::<bool>();
        let waiter = tokio::spawn({
            let gate = gate.clone();
            async move { gate.wait_ready(Duration::from_secs(5)).await }
        });

        tokio::task::yield_now().await;
        writer.set(false);

        assert_eq!(waiter.await.expect("join"), GateRead::Ready(false));
        assert!(gate.is_initialized());
    }

    /// Validates that a late first load does not clobber a value the writer
    /// already set explicitly.
    #[test]
    fn test_set_if_unset_keeps_existing_value() {
        let (writer, gate) = init_gate::<bool>();
        writer.set(true);
        assert!(!writer.set_if_unset(false));
        assert_eq!(gate.value(), Some(true));
    }

    #[test]
    fn test_subscribe_shares_value() {
        let (writer, _gate) = init_gate::<u32>();
        let reader = writer.subscribe();
        writer.set(7);
        assert_eq!(reader.value(), Some(7));
        assert!(writer.is_initialized());
    }
}
