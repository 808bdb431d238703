//! Persistent key-value storage port.
//!
//! Backs the persisted feature flags. Values are JSON so adapters do not need
//! to know what they store.
//!
//! # Example
//!
//! ```no_run
//! use gasoline_core::KeyValueStore;
//!
//! async fn pilot_enabled(store: &impl KeyValueStore) -> bool {
//!     matches!(store.get("ai_web_pilot_enabled").await, Ok(Some(serde_json::Value::Bool(true))))
//! }
//! ```

use async_trait::async_trait;
use gasoline_domain::Result;
use serde_json::Value;

/// Port for a persistent string-keyed JSON store.
///
/// Only [`crate::FeatureFlagWriter`] writes flag keys; everything else reads
/// through the flag cache.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a key; `Ok(None)` if it was never written or has been removed.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write a key, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Delete a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
