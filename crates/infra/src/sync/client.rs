//! Sync client and its poll loop
//!
//! One client per background process. `start` spawns the loop, `stop`
//! cancels it through a [`CancellationToken`] and joins it with a bounded
//! timeout. Command handlers spawned by the loop are not cancelled by `stop`;
//! their results stay queued for the next client.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gasoline_common::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, GateRead, ResilienceError,
};
use gasoline_core::{
    BackgroundContext, CommandDispatcher, FeatureFlagCache, FeatureFlagWriter, HandlerRegistry,
    KeyValueStore, PendingBatch, SettingsProvider, SyncTransport, TelemetryBatch, TelemetrySource,
};
use gasoline_domain::{
    new_session_id, CommandResult, Config, ConnectionStatus, GasolineError, SyncConfig,
    SyncRequest, SyncResponse, SyncSettings,
};
use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::errors::{SyncClientError, SyncClientResult};

/// Settings the sync loop runs with
#[derive(Debug, Clone)]
pub struct SyncClientConfig {
    pub sync: SyncConfig,
    pub breaker: CircuitBreakerConfig,
    /// Upper bound on telemetry entries per request
    pub max_logs_per_sync: usize,
    pub extension_version: String,
}

impl Default for SyncClientConfig {
    fn default() -> Self {
        let config = Config::default();
        Self {
            sync: config.sync,
            breaker: CircuitBreakerConfig::default(),
            max_logs_per_sync: config.telemetry.max_logs_per_sync,
            extension_version: config.server.extension_version,
        }
    }
}

impl SyncClientConfig {
    /// Derive the loop settings from the agent configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SyncClientError::Breaker`] if the breaker section is invalid.
    pub fn from_config(config: &Config) -> SyncClientResult<Self> {
        let breaker = CircuitBreakerConfig::builder()
            .max_failures(config.breaker.max_failures)
            .reset_timeout(Duration::from_millis(config.breaker.reset_timeout_ms))
            .initial_backoff(Duration::from_millis(config.breaker.initial_backoff_ms))
            .max_backoff(Duration::from_millis(config.breaker.max_backoff_ms))
            .build()?;

        Ok(Self {
            sync: config.sync.clone(),
            breaker,
            max_logs_per_sync: config.telemetry.max_logs_per_sync,
            extension_version: config.server.extension_version.clone(),
        })
    }
}

/// Collaborators injected at start
#[derive(Clone)]
pub struct SyncDeps {
    pub transport: Arc<dyn SyncTransport>,
    pub telemetry: Arc<dyn TelemetrySource>,
    pub settings: Arc<dyn SettingsProvider>,
    pub registry: Arc<HandlerRegistry>,
}

impl fmt::Debug for SyncDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncDeps")
            .field("registered_kinds", &self.registry.registered_kinds())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

struct RunningLoop {
    breaker: CircuitBreaker,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RunningLoop {
    fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Owner of the poll loop and the pilot flag's write path
pub struct SyncClient {
    config: SyncClientConfig,
    context: Arc<BackgroundContext>,
    pilot: Arc<FeatureFlagWriter>,
    session_id: String,
    status: Arc<watch::Sender<ConnectionStatus>>,
    wake: Arc<Notify>,
    running: Mutex<Option<RunningLoop>>,
}

impl fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncClient")
            .field("session_id", &self.session_id)
            .field("running", &self.is_running())
            .field("pending_results", &self.context.results.len())
            .finish()
    }
}

impl SyncClient {
    /// Build a stopped client with fresh background state.
    ///
    /// The pilot flag is read from `store` when the client first starts.
    pub fn new(config: SyncClientConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let (context, pilot) = BackgroundContext::new(store);
        let (status, _) = watch::channel(ConnectionStatus::default());
        Self {
            config,
            context,
            pilot: Arc::new(pilot),
            session_id: new_session_id(),
            status: Arc::new(status),
            wake: Arc::new(Notify::new()),
            running: Mutex::new(None),
        }
    }

    /// Spawn the poll loop. A second call while running is a no-op.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SyncClientError::Breaker`] if the breaker configuration is
    /// invalid.
    #[instrument(skip(self, deps), fields(session_id = %self.session_id))]
    pub fn start(&self, deps: SyncDeps) -> SyncClientResult<StartOutcome> {
        let mut running = self.running.lock();
        if running.as_ref().is_some_and(RunningLoop::is_active) {
            debug!("sync client already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let breaker = CircuitBreaker::new(self.config.breaker.clone())?;
        let cancel = CancellationToken::new();

        if !self.context.pilot.is_initialized() {
            let pilot = Arc::clone(&self.pilot);
            tokio::spawn(async move {
                pilot.load().await;
            });
        }

        let missing = deps.registry.missing_kinds();
        if !missing.is_empty() {
            info!(?missing, "command kinds without a handler will report unknown_action");
        }

        let dispatcher = CommandDispatcher::new(
            Arc::clone(&self.context),
            Arc::clone(&deps.registry),
            self.config.sync.flag_wait_timeout(),
        );
        let worker = SyncLoop {
            config: self.config.clone(),
            context: Arc::clone(&self.context),
            deps,
            dispatcher,
            breaker: breaker.clone(),
            status: Arc::clone(&self.status),
            wake: Arc::clone(&self.wake),
            session_id: self.session_id.clone(),
            last_ack: None,
        };
        let handle = tokio::spawn(worker.run(cancel.clone()));

        *running = Some(RunningLoop { breaker, cancel, handle });
        info!("sync client started");
        Ok(StartOutcome::Started)
    }

    /// Cancel the loop and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`SyncClientError::StopTimeout`] if the loop is still running
    /// after `sync.stop_timeout_ms` (it is then aborted), or
    /// [`SyncClientError::TaskJoinFailed`] if it panicked.
    #[instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn stop(&self) -> SyncClientResult<StopOutcome> {
        let running = self.running.lock().take();
        let Some(running) = running else {
            return Ok(StopOutcome::NotRunning);
        };

        info!("stopping sync client");
        running.cancel.cancel();

        let timeout = self.config.sync.stop_timeout();
        let mut handle = running.handle;
        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) if err.is_cancelled() => {}
            Ok(Err(err)) => return Err(SyncClientError::TaskJoinFailed(err.to_string())),
            Err(_) => {
                handle.abort();
                warn!(timeout_ms = timeout.as_millis() as u64, "sync loop did not stop in time");
                return Err(SyncClientError::StopTimeout { timeout });
            }
        }

        self.status.send_modify(|status| status.connected = false);
        info!("sync client stopped");
        Ok(StopOutcome::Stopped)
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().as_ref().is_some_and(RunningLoop::is_active)
    }

    /// Close the breaker and run the next cycle now.
    ///
    /// Returns `false` if no loop is running.
    pub fn reset_connection(&self) -> bool {
        let running = self.running.lock();
        let Some(running) = running.as_ref() else {
            return false;
        };

        running.breaker.reset();
        let state = running.breaker.get_state();
        self.status.send_modify(|status| status.breaker_state = state.as_str().to_string());
        self.wake.notify_one();
        info!("connection reset requested");
        true
    }

    /// Queue a result produced outside the loop's own dispatch.
    pub fn queue_command_result(&self, result: CommandResult) {
        self.context.results.queue_command_result(result);
    }

    /// Persist and publish the pilot toggle. The only write path to the flag.
    pub async fn set_pilot_enabled(&self, enabled: bool) -> Result<(), GasolineError> {
        self.pilot.set_enabled(enabled).await
    }

    pub fn pilot_flag(&self) -> FeatureFlagCache {
        self.context.pilot.clone()
    }

    /// Status published by the latest cycle
    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Breaker counters of the running loop, if any
    pub fn breaker_stats(&self) -> Option<CircuitBreakerStats> {
        self.running.lock().as_ref().map(|running| running.breaker.stats())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn context(&self) -> &Arc<BackgroundContext> {
        &self.context
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.cancel.cancel();
        }
    }
}

struct SyncLoop {
    config: SyncClientConfig,
    context: Arc<BackgroundContext>,
    deps: SyncDeps,
    dispatcher: CommandDispatcher,
    breaker: CircuitBreaker,
    status: Arc<watch::Sender<ConnectionStatus>>,
    wake: Arc<Notify>,
    session_id: String,
    last_ack: Option<String>,
}

impl SyncLoop {
    async fn run(mut self, cancel: CancellationToken) {
        debug!(session_id = %self.session_id, "sync loop running");
        let mut delay = Duration::ZERO;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.wake.notified() => debug!("sync loop woken early"),
                _ = tokio::time::sleep(delay) => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = self.cycle() => delay = next,
            }
        }

        debug!(session_id = %self.session_id, "sync loop exited");
    }

    /// One request/response exchange; returns the delay before the next.
    async fn cycle(&mut self) -> Duration {
        let settings = match self.context.pilot.wait(self.config.sync.flag_wait_timeout()).await {
            GateRead::Ready(pilot_enabled) => {
                Some(SyncSettings::new(pilot_enabled, &self.deps.settings.capture_settings()))
            }
            GateRead::Unknown => {
                debug!("pilot flag not loaded yet, omitting settings");
                None
            }
        };

        let batch = self.context.results.drain_for_send();
        let logs = self.deps.telemetry.peek_logs(self.config.max_logs_per_sync);
        let request = SyncRequest {
            session_id: self.session_id.clone(),
            extension_version: Some(self.config.extension_version.clone()),
            settings,
            extension_logs: logs.logs().to_vec(),
            last_command_ack: self.last_ack.clone(),
            command_results: batch.results().to_vec(),
        };

        let transport = Arc::clone(&self.deps.transport);
        let outcome = self.breaker.execute(|| async move { transport.sync(&request).await }).await;

        match outcome {
            Ok(response) => self.on_success(&batch, &logs, response),
            Err(err) => self.on_failure(&batch, &logs, err),
        }
    }

    fn on_success(
        &mut self,
        batch: &PendingBatch,
        logs: &TelemetryBatch,
        response: SyncResponse,
    ) -> Duration {
        let delivered = self.context.results.confirm_delivered(batch);
        let logs_sent = self.deps.telemetry.confirm_logs(logs);
        if let Some(last) = response.commands.last() {
            self.last_ack = Some(last.id.clone());
        }

        let received = response.commands.len();
        for command in response.commands {
            let dispatcher = self.dispatcher.clone();
            tokio::spawn(async move {
                dispatcher.dispatch(command).await;
            });
        }

        let pending = self.context.results.len();
        let state = self.breaker.get_state();
        let server_version = response.server_version;
        self.status.send_modify(|status| {
            status.mark_connected(Utc::now(), server_version);
            status.breaker_state = state.as_str().to_string();
            status.pending_results = pending;
        });

        debug!(delivered, logs_sent, received, pending, "sync cycle complete");
        self.config.sync.next_poll(response.next_poll_ms)
    }

    fn on_failure(
        &self,
        batch: &PendingBatch,
        logs: &TelemetryBatch,
        err: ResilienceError<GasolineError>,
    ) -> Duration {
        if err.is_rejection() {
            debug!(error = %err, "sync skipped by circuit breaker");
        } else {
            warn!(error = %err, kept = batch.len(), kept_logs = logs.len(), "sync cycle failed");
        }

        let retry_after = self.breaker.retry_after();
        let pending = self.context.results.len();
        let state = self.breaker.get_state();
        let message = err.to_string();
        self.status.send_modify(|status| {
            status.mark_failed(message);
            status.breaker_state = state.as_str().to_string();
            status.pending_results = pending;
        });

        self.config.sync.error_poll().max(retry_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_agent_config() {
        let mut config = Config::default();
        config.breaker.max_failures = 3;
        config.breaker.reset_timeout_ms = 2_000;
        config.telemetry.max_logs_per_sync = 50;

        let client_config = SyncClientConfig::from_config(&config).unwrap();
        assert_eq!(client_config.breaker.max_failures, 3);
        assert_eq!(client_config.breaker.reset_timeout, Duration::from_secs(2));
        assert_eq!(client_config.max_logs_per_sync, 50);
    }

    #[test]
    fn test_config_rejects_invalid_breaker() {
        let mut config = Config::default();
        config.breaker.max_failures = 0;
        assert!(matches!(SyncClientConfig::from_config(&config), Err(SyncClientError::Breaker(_))));
    }
}
