//! Pilot command pipeline
//!
//! Commands pushed by the server flow through
//! [`CommandDispatcher::dispatch`]: dedupe by id in the [`ProcessingSet`],
//! gate pilot actions on the [`FeatureFlagCache`], route through the
//! [`HandlerRegistry`], await the handler, and enqueue exactly one result on
//! the [`PendingResultQueue`] for the next sync cycle.

pub mod context;
pub mod dispatcher;
pub mod flag;
pub mod handler;
pub mod logging;
pub mod processing;
pub mod registry;
pub mod results;

pub use context::BackgroundContext;
pub use dispatcher::{CommandDispatcher, DispatchOutcome};
pub use flag::{feature_flag, FeatureFlagCache, FeatureFlagWriter, GateRejection};
pub use handler::{CommandHandler, HandlerError, HandlerOutcome, WithTimeout};
pub use logging::log_command_execution;
pub use processing::{ProcessingGuard, ProcessingSet};
pub use registry::HandlerRegistry;
pub use results::{PendingBatch, PendingResultQueue};
