//! Command dispatcher
//!
//! One call to [`CommandDispatcher::dispatch`] takes a command from "received"
//! to "result queued". The handler is awaited to completion before the id is
//! released and the result enqueued; returning early is what causes
//! premature cleanup and duplicate redelivery.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use gasoline_domain::constants::{
    HANDLER_FAILED_ERROR, HANDLER_PANICKED_ERROR, HANDLER_TIMEOUT_ERROR, UNKNOWN_ACTION_ERROR,
};
use gasoline_domain::{Command, CommandResult};
use serde_json::json;
use tracing::{debug, error, instrument};

use super::context::BackgroundContext;
use super::handler::{HandlerError, HandlerOutcome};
use super::logging::log_command_execution;
use super::registry::HandlerRegistry;

/// What happened to a dispatched command
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The id was already being handled; nothing was run or queued
    Skipped,
    /// The command ran (or was refused) and this result was queued
    Completed(CommandResult),
}

impl DispatchOutcome {
    pub fn result(&self) -> Option<&CommandResult> {
        match self {
            DispatchOutcome::Completed(result) => Some(result),
            DispatchOutcome::Skipped => None,
        }
    }
}

/// Routes commands to handlers and records exactly one result per command
#[derive(Clone)]
pub struct CommandDispatcher {
    context: Arc<BackgroundContext>,
    registry: Arc<HandlerRegistry>,
    flag_wait: Duration,
}

impl CommandDispatcher {
    pub fn new(
        context: Arc<BackgroundContext>,
        registry: Arc<HandlerRegistry>,
        flag_wait: Duration,
    ) -> Self {
        Self { context, registry, flag_wait }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Handle one command end to end.
    #[instrument(skip(self, command), fields(command_id = %command.id, command_type = %command.command_type))]
    pub async fn dispatch(&self, command: Command) -> DispatchOutcome {
        let Some(guard) = self.context.processing.try_begin(&command.id) else {
            debug!("command already in flight, skipping duplicate delivery");
            return DispatchOutcome::Skipped;
        };

        let started = Instant::now();
        let result = self.execute(&command).await;
        drop(guard);

        log_command_execution(&command, result.status, started.elapsed());
        self.context.results.queue_command_result(result.clone());
        DispatchOutcome::Completed(result)
    }

    async fn execute(&self, command: &Command) -> CommandResult {
        let kind = command.kind();

        if kind.is_some_and(|k| k.requires_pilot()) {
            if let Err(rejection) = self.context.pilot.check(self.flag_wait).await {
                debug!(%rejection, "gated command refused");
                return CommandResult::error(
                    command,
                    rejection.error_code(),
                    Some(rejection.detail()),
                );
            }
        }

        let Some(handler) = kind.and_then(|k| self.registry.get(k)) else {
            return CommandResult::error(command, UNKNOWN_ACTION_ERROR, None);
        };

        match AssertUnwindSafe(handler.handle(command)).catch_unwind().await {
            Ok(Ok(outcome)) => outcome_to_result(command, outcome),
            Ok(Err(HandlerError::TimedOut(timeout))) => {
                debug!(timeout_ms = timeout.as_millis() as u64, "handler timed out");
                CommandResult::timeout(command, HANDLER_TIMEOUT_ERROR)
            }
            Ok(Err(err)) => CommandResult::error(command, err.to_string(), None),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(panic = %message, "handler panicked");
                CommandResult::error(
                    command,
                    HANDLER_PANICKED_ERROR,
                    Some(json!({ "message": message })),
                )
            }
        }
    }
}

fn outcome_to_result(command: &Command, outcome: HandlerOutcome) -> CommandResult {
    if outcome.success {
        CommandResult::complete(command, outcome.result.unwrap_or(serde_json::Value::Null))
    } else {
        let error = outcome.error.unwrap_or_else(|| HANDLER_FAILED_ERROR.to_string());
        CommandResult::error(command, error, outcome.result)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
