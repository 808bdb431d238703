//! # Gasoline Core
//!
//! Protocol logic for the background sync agent - no infrastructure
//! dependencies.
//!
//! This crate contains:
//! - The pilot command pipeline (dedupe, gate, route, result queue)
//! - The feature flag cache and its single writer
//! - Port/adapter interfaces (traits) for every collaborator
//!
//! ## Architecture Principles
//! - Only depends on `gasoline-common` and `gasoline-domain`
//! - No HTTP, filesystem, or platform code
//! - All external dependencies via traits
//! - State lives in an explicit [`BackgroundContext`], never in statics

pub mod pilot;
pub mod sync;

// Infrastructure ports
pub mod messaging_ports;
pub mod storage_ports;

// Re-export specific items to avoid ambiguity
pub use messaging_ports::ContextMessenger;
pub use pilot::{
    feature_flag, BackgroundContext, CommandDispatcher, CommandHandler, DispatchOutcome,
    FeatureFlagCache, FeatureFlagWriter, GateRejection, HandlerError, HandlerOutcome,
    HandlerRegistry, PendingBatch, PendingResultQueue, ProcessingGuard, ProcessingSet,
    WithTimeout,
};
pub use storage_ports::KeyValueStore;
pub use sync::ports::{SettingsProvider, SyncTransport, TelemetryBatch, TelemetrySource};
