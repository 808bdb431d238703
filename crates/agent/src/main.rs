//! Gasoline background agent
//!
//! Keeps the sync loop with the local dev server running until Ctrl-C.

use std::sync::Arc;

use gasoline_agent::page::serve_headless;
use gasoline_agent::utils::logging::{error_label, init_tracing};
use gasoline_agent::AppContext;
use gasoline_infra::{config, TelemetryBuffer};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    let config = match config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("gasoline-agent: {err}");
            std::process::exit(2);
        }
    };

    let telemetry = Arc::new(TelemetryBuffer::new(config.telemetry.buffer_capacity));
    init_tracing(&config.logging, &config.telemetry, telemetry.clone())?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "could not read .env"),
    }

    let (ctx, endpoint) = AppContext::new(config, telemetry)?;
    tokio::spawn(serve_headless(endpoint));

    ctx.start()?;
    info!(session_id = ctx.sync_client.session_id(), "gasoline agent running");

    let mut status = ctx.sync_client.subscribe_status();
    let status_task = tokio::spawn(async move {
        let mut was_connected = false;
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            if current.connected != was_connected {
                was_connected = current.connected;
                if current.connected {
                    info!(server_version = ?current.server_version, "connected to server");
                } else {
                    info!(error = ?current.last_error, "disconnected from server");
                }
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    if let Err(err) = ctx.shutdown().await {
        error!(error = %err, kind = error_label(&err), "sync client did not stop cleanly");
    }
    status_task.abort();
    Ok(())
}
