//! # Gasoline Infrastructure
//!
//! Infrastructure implementations of core ports and the sync runtime.
//!
//! This crate contains:
//! - The HTTP sync transport (reqwest)
//! - The [`SyncClient`] poll loop and its lifecycle
//! - Key-value store adapters (in-memory, JSON file)
//! - The telemetry buffer and its tracing capture layer
//! - Channel-based cross-context messaging and relay handlers
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `gasoline-core`
//! - Depends on `gasoline-common`, `gasoline-domain` and `gasoline-core`
//! - Contains all "impure" code (network, filesystem, spawned tasks)

pub mod api;
pub mod config;
pub mod handlers;
pub mod messaging;
pub mod settings;
pub mod storage;
pub mod sync;
pub mod telemetry;

// Re-export commonly used items
pub use api::{HttpSyncTransport, TransportError, TransportErrorCategory};
pub use handlers::{default_registry, RelayHandler};
pub use messaging::{context_channel, ChannelMessenger, ContextEndpoint, ContextRequest};
pub use settings::StaticSettings;
pub use storage::{JsonFileStore, MemoryStore};
pub use sync::{StartOutcome, StopOutcome, SyncClient, SyncClientConfig, SyncClientError, SyncDeps};
pub use telemetry::{ExtensionLogLayer, TelemetryBuffer};
