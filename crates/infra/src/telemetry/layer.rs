//! tracing layer that copies the process's own events into the telemetry
//! buffer, so background diagnostics reach the server as `extension_logs`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use gasoline_domain::constants::BACKGROUND_LOG_SOURCE;
use gasoline_domain::{ExtensionLog, LogLevel};
use serde_json::{Map, Number, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use super::buffer::TelemetryBuffer;

/// Captures events at or above `max_level`, optionally only from targets
/// under a prefix.
#[derive(Debug, Clone)]
pub struct ExtensionLogLayer {
    buffer: Arc<TelemetryBuffer>,
    max_level: Level,
    target_prefix: Option<String>,
}

impl ExtensionLogLayer {
    pub fn new(buffer: Arc<TelemetryBuffer>, max_level: Level) -> Self {
        Self { buffer, max_level, target_prefix: None }
    }

    /// Level parsed from config (`"warn"`, `"info"`, ...); unknown values
    /// fall back to `info`.
    pub fn with_level_name(buffer: Arc<TelemetryBuffer>, level: &str) -> Self {
        Self::new(buffer, Level::from_str(level.trim()).unwrap_or(Level::INFO))
    }

    /// Only capture events whose target starts with `prefix`
    pub fn with_target_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.target_prefix = Some(prefix.into());
        self
    }

    fn accepts(&self, level: &Level, target: &str) -> bool {
        // More verbose levels compare greater.
        if *level > self.max_level {
            return false;
        }
        match &self.target_prefix {
            Some(prefix) => target.starts_with(prefix.as_str()),
            None => true,
        }
    }
}

impl<S> Layer<S> for ExtensionLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !self.accepts(meta.level(), meta.target()) {
            return;
        }

        let mut visitor = EventFieldVisitor::default();
        event.record(&mut visitor);

        let mut log = ExtensionLog::new(
            log_level(meta.level()),
            BACKGROUND_LOG_SOURCE,
            meta.target(),
            visitor.message.unwrap_or_default(),
        );
        if !visitor.data.is_empty() {
            log = log.with_data(Value::Object(visitor.data));
        }
        self.buffer.push(log);
    }
}

fn log_level(level: &Level) -> LogLevel {
    match *level {
        Level::ERROR => LogLevel::Error,
        Level::WARN => LogLevel::Warn,
        Level::INFO => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

#[derive(Default)]
struct EventFieldVisitor {
    message: Option<String>,
    data: Map<String, Value>,
}

impl Visit for EventFieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.data.insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.data.insert(field.name().to_string(), Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.data.insert(field.name().to_string(), Value::Number(value.into()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.data.insert(field.name().to_string(), Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Some(n) = Number::from_f64(value) {
            self.data.insert(field.name().to_string(), Value::Number(n));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.data.insert(field.name().to_string(), Value::String(format!("{value:?}")));
        }
    }
}
