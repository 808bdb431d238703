//! Shared helpers for the sync integration tests

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gasoline_common::CircuitBreakerConfig;
use gasoline_core::{CommandHandler, HandlerError, HandlerOutcome, HandlerRegistry, KeyValueStore};
use gasoline_domain::{Command, CommandKind, Result, ServerConfig, SyncConfig};
use gasoline_infra::{
    HttpSyncTransport, MemoryStore, StaticSettings, SyncClientConfig, SyncDeps, TelemetryBuffer,
};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const VERSION: &str = "1.2.3";

/// Millisecond-scale cadence so tests finish quickly
pub fn fast_config() -> SyncClientConfig {
    SyncClientConfig {
        sync: SyncConfig {
            default_poll_ms: 20,
            min_poll_ms: 10,
            max_poll_ms: 100,
            error_poll_ms: 20,
            flag_wait_timeout_ms: 50,
            stop_timeout_ms: 1_000,
        },
        breaker: CircuitBreakerConfig::builder()
            .max_failures(2)
            .reset_timeout(Duration::from_millis(100))
            .initial_backoff(Duration::from_millis(5))
            .max_backoff(Duration::from_millis(20))
            .build()
            .expect("valid breaker config"),
        max_logs_per_sync: 10,
        extension_version: VERSION.to_string(),
    }
}

pub fn server_config(server: &MockServer) -> ServerConfig {
    ServerConfig {
        url: server.uri(),
        request_timeout_ms: 1_000,
        extension_version: VERSION.to_string(),
    }
}

pub fn store_with_pilot(enabled: bool) -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::with_entries([("ai_web_pilot_enabled", json!(enabled))]))
}

pub fn deps(
    server: &MockServer,
    telemetry: Arc<TelemetryBuffer>,
    registry: HandlerRegistry,
) -> SyncDeps {
    let transport = HttpSyncTransport::new(&server_config(server)).expect("transport");
    SyncDeps {
        transport: Arc::new(transport),
        telemetry,
        settings: Arc::new(StaticSettings::default()),
        registry: Arc::new(registry),
    }
}

/// Echoes the command params back as the result
pub struct Echo;

#[async_trait]
impl CommandHandler for Echo {
    async fn handle(&self, command: &Command) -> std::result::Result<HandlerOutcome, HandlerError> {
        Ok(HandlerOutcome::success(json!({"echo": command.params})))
    }
}

pub fn echo_registry(kind: CommandKind) -> HandlerRegistry {
    HandlerRegistry::new().with(kind, Arc::new(Echo))
}

/// A store whose reads never complete, so the pilot flag stays unknown
pub struct HangingStore;

#[async_trait]
impl KeyValueStore for HangingStore {
    async fn get(&self, _key: &str) -> Result<Option<Value>> {
        std::future::pending().await
    }

    async fn set(&self, _key: &str, _value: Value) -> Result<()> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

/// JSON bodies of every request the server has seen, in arrival order
pub async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| serde_json::from_slice(&request.body).expect("json body"))
        .collect()
}

/// Poll the server's request log until `done` holds
pub async fn wait_for_requests<F>(server: &MockServer, done: F) -> Vec<Value>
where
    F: Fn(&[Value]) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let bodies = request_bodies(server).await;
        if done(&bodies) {
            return bodies;
        }
        assert!(Instant::now() < deadline, "timed out; saw {} requests", bodies.len());
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Results in a request body with the given id
pub fn results_with_id<'a>(body: &'a Value, id: &str) -> Vec<&'a Value> {
    body.get("command_results")
        .and_then(Value::as_array)
        .map(|results| results.iter().filter(|r| r["id"] == id).collect())
        .unwrap_or_default()
}
