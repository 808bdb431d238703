//! Logging setup and stable error labels

use std::sync::Arc;

use gasoline_domain::{GasolineError, LoggingConfig, TelemetryConfig};
use gasoline_infra::{ExtensionLogLayer, TelemetryBuffer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Only the agent's own crates are relayed as extension logs
const CAPTURE_TARGET_PREFIX: &str = "gasoline";

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `logging.level`. Events at or above
/// `telemetry.capture_level` from the agent's crates are also copied into
/// `telemetry`.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(
    logging: &LoggingConfig,
    telemetry: &TelemetryConfig,
    buffer: Arc<TelemetryBuffer>,
) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.level))?;

    let console = if logging.json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    let capture = ExtensionLogLayer::with_level_name(buffer, &telemetry.capture_level)
        .with_target_prefix(CAPTURE_TARGET_PREFIX);

    tracing_subscriber::registry()
        .with(console.with_filter(filter))
        .with(capture)
        .try_init()?;
    Ok(())
}

/// Convert a `GasolineError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &GasolineError) -> &'static str {
    match error {
        GasolineError::Config(_) => "config",
        GasolineError::Network(_) => "network",
        GasolineError::Storage(_) => "storage",
        GasolineError::Messaging(_) => "messaging",
        GasolineError::Timeout(_) => "timeout",
        GasolineError::NotFound(_) => "not_found",
        GasolineError::InvalidInput(_) => "invalid_input",
        GasolineError::Internal(_) => "internal",
    }
}
