use std::time::Duration;

use gasoline_domain::{Command, CommandStatus};
use tracing::{info, warn};

/// Log the outcome of one dispatched command with structured fields.
///
/// Field names are stable so log pipelines can key on them. Params are never
/// logged; they can carry page content.
#[inline]
pub fn log_command_execution(command: &Command, status: CommandStatus, elapsed: Duration) {
    let duration_ms = elapsed.as_millis() as u64;
    let command_id = command.id.as_str();
    let command_type = command.command_type.as_str();

    if status == CommandStatus::Complete {
        info!(command_id, command_type, status = %status, duration_ms, "command_execution_success");
    } else {
        warn!(command_id, command_type, status = %status, duration_ms, "command_execution_failure");
    }
}
