//! Integration tests for the pilot command pipeline
//!
//! Drives `CommandDispatcher` with real handlers and a fresh
//! `BackgroundContext` per test, and reads results back the way the sync loop
//! does: `drain_for_send` then `confirm_delivered`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gasoline_core::{
    BackgroundContext, CommandDispatcher, CommandHandler, DispatchOutcome, FeatureFlagWriter,
    HandlerError, HandlerOutcome, HandlerRegistry, KeyValueStore, WithTimeout,
};
use gasoline_domain::constants::PILOT_FLAG_KEY;
use gasoline_domain::{Command, CommandKind, CommandStatus, GasolineError, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{oneshot, Notify};

const FLAG_WAIT: Duration = Duration::from_millis(50);

#[derive(Default)]
struct MapStore {
    values: Mutex<HashMap<String, Value>>,
    fail_writes: bool,
}

#[async_trait]
impl KeyValueStore for MapStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        if self.fail_writes {
            return Err(GasolineError::Storage("disk full".into()));
        }
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// Echoes params back and counts invocations.
#[derive(Default)]
struct Echo {
    calls: AtomicUsize,
}

#[async_trait]
impl CommandHandler for Echo {
    async fn handle(&self, command: &Command) -> std::result::Result<HandlerOutcome, HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HandlerOutcome::success(command.params.clone()))
    }
}

/// Blocks until released, signalling once it has started.
struct Held {
    started: Arc<Notify>,
    release: Mutex<Option<oneshot::Receiver<Value>>>,
}

#[async_trait]
impl CommandHandler for Held {
    async fn handle(&self, _command: &Command) -> std::result::Result<HandlerOutcome, HandlerError> {
        self.started.notify_one();
        let rx = self.release.lock().take();
        match rx {
            Some(rx) => rx
                .await
                .map(HandlerOutcome::success)
                .map_err(|_| HandlerError::Failed("released without value".into())),
            None => Err(HandlerError::Failed("already consumed".into())),
        }
    }
}

struct Panicking;

#[async_trait]
impl CommandHandler for Panicking {
    async fn handle(&self, _command: &Command) -> std::result::Result<HandlerOutcome, HandlerError> {
        panic!("selector exploded");
    }
}

struct Refusing;

#[async_trait]
impl CommandHandler for Refusing {
    async fn handle(&self, _command: &Command) -> std::result::Result<HandlerOutcome, HandlerError> {
        Ok(HandlerOutcome::failure("element_not_found", Some(json!({"selector": "#go"}))))
    }
}

struct Hanging;

#[async_trait]
impl CommandHandler for Hanging {
    async fn handle(&self, _command: &Command) -> std::result::Result<HandlerOutcome, HandlerError> {
        std::future::pending::<()>().await;
        Ok(HandlerOutcome::success(Value::Null))
    }
}

async fn setup(
    registry: HandlerRegistry,
    pilot_enabled: Option<bool>,
) -> (Arc<BackgroundContext>, FeatureFlagWriter, CommandDispatcher) {
    let store = Arc::new(MapStore::default());
    if let Some(enabled) = pilot_enabled {
        store.values.lock().insert(PILOT_FLAG_KEY.to_string(), Value::Bool(enabled));
    }
    let (context, writer) = BackgroundContext::new(store);
    if pilot_enabled.is_some() {
        writer.load().await;
    }
    let dispatcher = CommandDispatcher::new(context.clone(), Arc::new(registry), FLAG_WAIT);
    (context, writer, dispatcher)
}

/// Scenario: a pilot command whose handler is still pending is not reported
/// in cycle 1, and is reported exactly once in cycle 2 after it settles.
///
/// # Test Steps
/// 1. Dispatch `q-1` (`browser_action`, `corr-1`) against a held handler
/// 2. Cycle 1 snapshot is empty and is confirmed
/// 3. Release the handler and await the dispatch
/// 4. Cycle 2 snapshot holds exactly one `complete` result for `q-1`
#[tokio::test]
async fn test_pending_handler_result_arrives_next_cycle() {
    let started = Arc::new(Notify::new());
    let (release_tx, release_rx) = oneshot::channel();
    let held = Held { started: started.clone(), release: Mutex::new(Some(release_rx)) };
    let registry = HandlerRegistry::new().with(CommandKind::BrowserAction, Arc::new(held));
    let (context, _writer, dispatcher) = setup(registry, Some(true)).await;

    let cmd = Command::new("q-1", "browser_action", json!({"action": "refresh"}))
        .with_correlation_id("corr-1");
    let task = tokio::spawn({
        let dispatcher = dispatcher.clone();
        async move { dispatcher.dispatch(cmd).await }
    });
    started.notified().await;

    let cycle1 = context.results.drain_for_send();
    assert!(cycle1.is_empty());
    context.results.confirm_delivered(&cycle1);
    assert!(context.processing.contains("q-1"));

    release_tx.send(json!({"refreshed": true})).expect("handler waiting");
    let outcome = task.await.expect("join");
    assert!(matches!(outcome, DispatchOutcome::Completed(_)));

    let cycle2 = context.results.drain_for_send();
    assert_eq!(cycle2.len(), 1);
    let result = &cycle2.results()[0];
    assert_eq!(result.id, "q-1");
    assert_eq!(result.correlation_id.as_deref(), Some("corr-1"));
    assert_eq!(result.status, CommandStatus::Complete);
    assert!(!context.processing.contains("q-1"));

    context.results.confirm_delivered(&cycle2);
    assert!(context.results.drain_for_send().is_empty());
}

/// Validates duplicate delivery of an in-flight id is skipped and never
/// reaches the handler a second time.
#[tokio::test]
async fn test_duplicate_delivery_skipped_while_in_flight() {
    let started = Arc::new(Notify::new());
    let (release_tx, release_rx) = oneshot::channel();
    let held = Held { started: started.clone(), release: Mutex::new(Some(release_rx)) };
    let registry = HandlerRegistry::new().with(CommandKind::Dom, Arc::new(held));
    let (context, _writer, dispatcher) = setup(registry, None).await;

    let cmd = Command::new("q-7", "dom", json!({"selector": "body"}));
    let first = tokio::spawn({
        let dispatcher = dispatcher.clone();
        let cmd = cmd.clone();
        async move { dispatcher.dispatch(cmd).await }
    });
    started.notified().await;

    assert_eq!(dispatcher.dispatch(cmd).await, DispatchOutcome::Skipped);

    release_tx.send(json!("<body/>")).expect("handler waiting");
    first.await.expect("join");
    assert_eq!(context.results.len(), 1);
}

/// Scenario: a disabled pilot flag refuses pilot actions without invoking any
/// handler.
#[tokio::test]
async fn test_disabled_flag_refuses_pilot_actions() {
    let echo = Arc::new(Echo::default());
    let registry = HandlerRegistry::new().with(CommandKind::Execute, echo.clone());
    let (_context, _writer, dispatcher) = setup(registry, Some(false)).await;

    let outcome = dispatcher.dispatch(Command::new("q-2", "execute", json!({"script": "1"}))).await;
    let result = outcome.result().expect("result");

    assert_eq!(result.status, CommandStatus::Error);
    assert_eq!(result.error.as_deref(), Some("ai_web_pilot_disabled"));
    assert_eq!(result.result, Some(json!({"flag_state": "disabled"})));
    assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
}

/// Validates a flag that never loaded is reported as unknown, not guessed.
#[tokio::test]
async fn test_unloaded_flag_is_reported_unknown() {
    let echo = Arc::new(Echo::default());
    let registry = HandlerRegistry::new().with(CommandKind::Highlight, echo.clone());
    let (_context, _writer, dispatcher) = setup(registry, None).await;

    let outcome = dispatcher.dispatch(Command::new("q-3", "highlight", json!({}))).await;
    let result = outcome.result().expect("result");

    assert_eq!(result.error.as_deref(), Some("ai_web_pilot_disabled"));
    assert_eq!(result.result, Some(json!({"flag_state": "unknown"})));
    assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
}

/// Validates observation queries bypass the pilot gate entirely.
#[tokio::test]
async fn test_observation_queries_are_not_gated() {
    let echo = Arc::new(Echo::default());
    let registry = HandlerRegistry::new().with(CommandKind::PageInfo, echo.clone());
    let (_context, _writer, dispatcher) = setup(registry, Some(false)).await;

    let outcome = dispatcher.dispatch(Command::new("q-4", "page_info", json!({"tab": 1}))).await;
    assert_eq!(outcome.result().expect("result").status, CommandStatus::Complete);
    assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
}

/// Validates unknown types and unregistered kinds both yield
/// `unknown_action`.
#[tokio::test]
async fn test_unknown_and_unregistered_kinds() {
    let (context, _writer, dispatcher) = setup(HandlerRegistry::new(), Some(true)).await;

    let unknown = dispatcher.dispatch(Command::new("q-5", "warp_drive", json!({}))).await;
    let unregistered = dispatcher.dispatch(Command::new("q-6", "tabs", json!({}))).await;

    for outcome in [unknown, unregistered] {
        let result = outcome.result().expect("result");
        assert_eq!(result.error.as_deref(), Some("unknown_action"));
    }
    assert_eq!(context.results.len(), 2);
    assert!(context.processing.is_empty());
}

/// Validates handler faults of every shape become one error result each and
/// do not disturb each other.
#[tokio::test]
async fn test_handler_faults_are_isolated() {
    let registry = HandlerRegistry::new()
        .with(CommandKind::Execute, Arc::new(Panicking))
        .with(CommandKind::DomAction, Arc::new(Refusing))
        .with(
            CommandKind::Subtitle,
            Arc::new(WithTimeout::new(Hanging, Duration::from_millis(20))),
        )
        .with(CommandKind::Tabs, Arc::new(Echo::default()));
    let (context, _writer, dispatcher) = setup(registry, Some(true)).await;

    let commands = vec![
        Command::new("p-1", "execute", json!({})),
        Command::new("p-2", "dom_action", json!({})),
        Command::new("p-3", "subtitle", json!({"text": "hi"})),
        Command::new("p-4", "tabs", json!({})),
    ];
    let outcomes = futures::future::join_all(
        commands.into_iter().map(|cmd| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.dispatch(cmd).await })
        }),
    )
    .await;
    assert!(outcomes.iter().all(|o| o.is_ok()), "no fault escapes the dispatcher");

    let batch = context.results.drain_for_send();
    let by_id: HashMap<_, _> = batch.results().iter().map(|r| (r.id.as_str(), r)).collect();

    assert_eq!(by_id["p-1"].error.as_deref(), Some("handler_panicked"));
    assert_eq!(by_id["p-2"].error.as_deref(), Some("element_not_found"));
    assert_eq!(by_id["p-2"].result, Some(json!({"selector": "#go"})));
    assert_eq!(by_id["p-3"].status, CommandStatus::Timeout);
    assert_eq!(by_id["p-3"].error.as_deref(), Some("handler_timeout"));
    assert_eq!(by_id["p-4"].status, CommandStatus::Complete);
    assert!(context.processing.is_empty());
}

/// Scenario: 20 sequential commands each produce exactly one result with a
/// unique correlation id.
#[tokio::test]
async fn test_twenty_sequential_commands() {
    let echo = Arc::new(Echo::default());
    let registry = HandlerRegistry::new().with(CommandKind::BrowserAction, echo.clone());
    let (context, _writer, dispatcher) = setup(registry, Some(true)).await;

    for i in 0..20 {
        let cmd = Command::new(format!("q-{i}"), "browser_action", json!({"step": i}))
            .with_correlation_id(format!("corr-{i}"));
        assert!(matches!(dispatcher.dispatch(cmd).await, DispatchOutcome::Completed(_)));
    }

    let batch = context.results.drain_for_send();
    let correlations: HashSet<_> =
        batch.results().iter().filter_map(|r| r.correlation_id.clone()).collect();

    assert_eq!(batch.len(), 20);
    assert_eq!(correlations.len(), 20);
    assert!(batch.results().iter().all(|r| r.status == CommandStatus::Complete));
    assert_eq!(echo.calls.load(Ordering::SeqCst), 20);
}

/// Validates the single writer: a toggle is visible to existing readers, and a
/// failed persist leaves the cache untouched.
#[tokio::test]
async fn test_flag_writer_persists_then_updates_cache() {
    let store = Arc::new(MapStore::default());
    let (context, writer) = BackgroundContext::new(store.clone());

    assert!(!writer.load().await);
    assert_eq!(context.pilot.value(), Some(false));

    writer.set_enabled(true).await.expect("persist");
    assert_eq!(context.pilot.value(), Some(true));
    assert_eq!(store.values.lock().get(PILOT_FLAG_KEY), Some(&Value::Bool(true)));

    let broken = Arc::new(MapStore { fail_writes: true, ..Default::default() });
    let (context, writer) = BackgroundContext::new(broken);
    writer.load().await;
    assert!(writer.set_enabled(true).await.is_err());
    assert_eq!(context.pilot.value(), Some(false));
}
