//! Telemetry relayed to the server with each sync cycle
//!
//! [`TelemetryBuffer`] holds entries until a request carrying them is
//! accepted; [`ExtensionLogLayer`] feeds it from the process's own tracing
//! events. Only overflow loses entries: a failed or breaker-skipped cycle
//! leaves the buffer as it was.

pub mod buffer;
pub mod layer;

pub use buffer::TelemetryBuffer;
pub use layer::ExtensionLogLayer;
