//! Application context - dependency injection container

use std::sync::Arc;

use gasoline_core::KeyValueStore;
use gasoline_domain::{Config, Result};
use gasoline_infra::{
    context_channel, default_registry, ContextEndpoint, HttpSyncTransport, JsonFileStore,
    MemoryStore, StartOutcome, StaticSettings, StopOutcome, SyncClient, SyncClientConfig,
    SyncDeps, TelemetryBuffer,
};
use tracing::{info, warn};

/// Requests waiting for a context before senders back off
const CONTEXT_QUEUE_CAPACITY: usize = 64;

/// Application context - holds all services and dependencies
///
/// The key-value store is handed to the sync client and not kept here, so
/// `SyncClient::set_pilot_enabled` is the only way to change the persisted
/// pilot flag:
///
/// ```compile_fail
/// fn bypass(ctx: &gasoline_agent::AppContext) {
///     let _store = &ctx.store;
/// }
/// ```
pub struct AppContext {
    pub config: Config,
    pub telemetry: Arc<TelemetryBuffer>,
    pub settings: Arc<StaticSettings>,
    pub sync_client: Arc<SyncClient>,
    deps: SyncDeps,
}

impl AppContext {
    /// Wire every collaborator from `config`.
    ///
    /// `telemetry` is passed in so the logging layer can share it. The
    /// returned endpoint receives the requests relay handlers send to page
    /// and browser contexts; the caller decides who answers them.
    ///
    /// # Errors
    ///
    /// Returns `GasolineError::Config` for an invalid server URL or breaker
    /// section.
    pub fn new(config: Config, telemetry: Arc<TelemetryBuffer>) -> Result<(Self, ContextEndpoint)> {
        let store: Arc<dyn KeyValueStore> = match &config.storage.path {
            Some(path) => {
                info!(path = %path.display(), "using JSON file store");
                Arc::new(JsonFileStore::new(path))
            }
            None => {
                warn!("no storage path configured, pilot toggle will not survive restarts");
                Arc::new(MemoryStore::new())
            }
        };

        let transport = HttpSyncTransport::new(&config.server)?;
        let (messenger, endpoint) =
            context_channel(CONTEXT_QUEUE_CAPACITY, config.pilot.context_timeout());
        let registry = default_registry(Arc::new(messenger), &config.pilot);
        let settings = Arc::new(StaticSettings::new(config.capture.clone()));

        let client_config = SyncClientConfig::from_config(&config)?;
        let sync_client = Arc::new(SyncClient::new(client_config, store));

        let deps = SyncDeps {
            transport: Arc::new(transport),
            telemetry: telemetry.clone(),
            settings: settings.clone(),
            registry: Arc::new(registry),
        };

        Ok((Self { config, telemetry, settings, sync_client, deps }, endpoint))
    }

    /// Start the sync loop
    pub fn start(&self) -> Result<StartOutcome> {
        let outcome = self.sync_client.start(self.deps.clone())?;
        info!(server = %self.config.server.url, ?outcome, "sync client start requested");
        Ok(outcome)
    }

    /// Stop the sync loop
    pub async fn shutdown(&self) -> Result<StopOutcome> {
        let outcome = self.sync_client.stop().await?;
        info!(?outcome, pending = self.sync_client.context().results.len(), "agent shut down");
        Ok(outcome)
    }
}
