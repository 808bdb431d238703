//! Domain types and models
//!
//! - [`command`]: commands pushed by the server and the results sent back
//! - [`sync`]: `/sync` request/response payloads and telemetry entries
//! - [`status`]: connection status surfaced to the UI

pub mod command;
pub mod status;
pub mod sync;

pub use command::{Command, CommandKind, CommandResult, CommandStatus};
pub use status::ConnectionStatus;
pub use sync::{
    new_session_id, CaptureSettings, ExtensionLog, LogLevel, SyncRequest, SyncResponse,
    SyncSettings,
};
