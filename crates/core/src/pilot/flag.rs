//! Persisted feature flags
//!
//! A flag is split into a read side ([`FeatureFlagCache`]) that anything may
//! hold, and a write side ([`FeatureFlagWriter`]) that owns the store handle.
//! The writer is created once, alongside the cache, and is not `Clone`, so
//! the component holding it is the only one able to change the persisted
//! value. That keeps the in-memory cache and the store from diverging.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use gasoline_common::cache::{init_gate, GateRead, GateWriter, InitGate};
use gasoline_domain::Result;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::storage_ports::KeyValueStore;

/// Why a gated command was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// The flag is known and off
    Disabled { feature: &'static str },
    /// The flag's first load has not finished within the wait bound
    Unknown { feature: &'static str },
}

impl GateRejection {
    /// Error code carried by the command result, `<feature>_disabled`.
    pub fn error_code(&self) -> String {
        let (Self::Disabled { feature } | Self::Unknown { feature }) = self;
        format!("{feature}_disabled")
    }

    /// Detail attached to the result so the server can tell the cases apart.
    pub fn detail(&self) -> Value {
        match self {
            Self::Disabled { .. } => json!({"flag_state": "disabled"}),
            Self::Unknown { .. } => json!({"flag_state": "unknown"}),
        }
    }
}

impl fmt::Display for GateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled { feature } => write!(f, "{feature} is disabled"),
            Self::Unknown { feature } => write!(f, "{feature} state not loaded yet"),
        }
    }
}

/// Create the cache and the single writer for one persisted flag.
pub fn feature_flag(
    feature: &'static str,
    key: &'static str,
    store: Arc<dyn KeyValueStore>,
) -> (FeatureFlagWriter, FeatureFlagCache) {
    let (writer, gate) = init_gate();
    (FeatureFlagWriter { feature, key, store, gate: writer }, FeatureFlagCache { feature, gate })
}

/// Read side of a persisted flag. Cheap to clone.
#[derive(Debug, Clone)]
pub struct FeatureFlagCache {
    feature: &'static str,
    gate: InitGate<bool>,
}

impl FeatureFlagCache {
    pub fn feature(&self) -> &'static str {
        self.feature
    }

    pub fn is_initialized(&self) -> bool {
        self.gate.is_initialized()
    }

    /// Cached value without waiting; `None` until the first load.
    pub fn value(&self) -> Option<bool> {
        self.gate.value()
    }

    /// Bounded wait for the first load.
    pub async fn wait(&self, timeout: Duration) -> GateRead<bool> {
        self.gate.wait_ready(timeout).await
    }

    /// Admit a gated action only if the flag is known to be on.
    pub async fn check(&self, timeout: Duration) -> std::result::Result<(), GateRejection> {
        match self.wait(timeout).await {
            GateRead::Ready(true) => Ok(()),
            GateRead::Ready(false) => Err(GateRejection::Disabled { feature: self.feature }),
            GateRead::Unknown => Err(GateRejection::Unknown { feature: self.feature }),
        }
    }
}

/// The only write path to a persisted flag
pub struct FeatureFlagWriter {
    feature: &'static str,
    key: &'static str,
    store: Arc<dyn KeyValueStore>,
    gate: GateWriter<bool>,
}

impl fmt::Debug for FeatureFlagWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureFlagWriter")
            .field("feature", &self.feature)
            .field("key", &self.key)
            .finish()
    }
}

impl FeatureFlagWriter {
    /// Populate the cache from the store.
    ///
    /// A missing key means off. An unreadable store also falls back to off,
    /// since treating an unknown pilot state as enabled is never safe. A value
    /// already set through [`FeatureFlagWriter::set_enabled`] is not
    /// overwritten.
    pub async fn load(&self) -> bool {
        let loaded = match self.store.get(self.key).await {
            Ok(Some(Value::Bool(enabled))) => enabled,
            Ok(Some(other)) => {
                warn!(key = self.key, value = %other, "non-boolean flag value, treating as off");
                false
            }
            Ok(None) => false,
            Err(err) => {
                warn!(key = self.key, error = %err, "failed to read flag, treating as off");
                false
            }
        };

        if self.gate.set_if_unset(loaded) {
            info!(feature = self.feature, enabled = loaded, "feature flag loaded");
        } else {
            debug!(feature = self.feature, "flag already set, load result ignored");
        }
        self.value().unwrap_or(loaded)
    }

    /// Persist a new value, then update the cache.
    ///
    /// On a store error the cache keeps its previous value.
    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.store.set(self.key, Value::Bool(enabled)).await?;
        self.gate.set(enabled);
        info!(feature = self.feature, enabled, "feature flag updated");
        Ok(())
    }

    pub fn value(&self) -> Option<bool> {
        self.subscribe().value()
    }

    /// A new read handle for this flag
    pub fn subscribe(&self) -> FeatureFlagCache {
        FeatureFlagCache { feature: self.feature, gate: self.gate.subscribe() }
    }
}
