//! Command handler port and decorators

use std::time::Duration;

use async_trait::async_trait;
use gasoline_domain::{Command, GasolineError};
use serde_json::Value;
use thiserror::Error;

/// What a handler reports back after running a command.
///
/// `success: false` is a handled failure (the page said no); it becomes an
/// error result without being treated as a fault.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutcome {
    pub success: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl HandlerOutcome {
    pub fn success(result: Value) -> Self {
        Self { success: true, result: Some(result), error: None }
    }

    pub fn failure(error: impl Into<String>, result: Option<Value>) -> Self {
        Self { success: false, result, error: Some(error.into()) }
    }

    /// Interpret a `{success, result, error}` reply object.
    ///
    /// A reply without a boolean `success` field is treated as a plain
    /// successful result.
    pub fn from_reply(reply: Value) -> Self {
        match reply.get("success").and_then(Value::as_bool) {
            Some(true) => Self::success(reply.get("result").cloned().unwrap_or(Value::Null)),
            Some(false) => Self {
                success: false,
                result: reply.get("result").cloned(),
                error: reply.get("error").and_then(Value::as_str).map(str::to_string),
            },
            None => Self::success(reply),
        }
    }
}

/// Fault raised by a handler
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error("handler timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Domain(#[from] GasolineError),
}

/// Trait implemented by every command type's executor
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the command to completion.
    async fn handle(&self, command: &Command) -> Result<HandlerOutcome, HandlerError>;
}

/// Bounds a handler's run time.
///
/// The dispatcher never cancels handlers on its own; a handler that can hang
/// should be wrapped in this so its id leaves the processing set.
#[derive(Debug, Clone)]
pub struct WithTimeout<H> {
    inner: H,
    timeout: Duration,
}

impl<H> WithTimeout<H> {
    pub fn new(inner: H, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<H> CommandHandler for WithTimeout<H>
where
    H: CommandHandler,
{
    async fn handle(&self, command: &Command) -> Result<HandlerOutcome, HandlerError> {
        match tokio::time::timeout(self.timeout, self.inner.handle(command)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(HandlerError::TimedOut(self.timeout)),
        }
    }
}
