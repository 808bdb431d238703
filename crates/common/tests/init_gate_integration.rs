//! Integration tests for the init gate: restart races between a slow
//! persistent read and readers that need the value.

#![cfg(feature = "runtime")]

use std::time::Duration;

use gasoline_common::cache::{init_gate, GateRead};

/// Validates a reader that starts before a slow load: the bounded wait
/// reports `Unknown`, and a later wait sees the loaded value.
#[tokio::test]
async fn test_slow_load_is_unknown_then_ready() {
    let (writer, gate) = init_gate::<bool>();

    let loader = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(80)).await;
        writer.set(true);
        writer
    });

    assert_eq!(gate.wait_ready(Duration::from_millis(10)).await, GateRead::Unknown);
    assert_eq!(gate.wait_ready(Duration::from_secs(2)).await, GateRead::Ready(true));

    let writer = loader.await.expect("join");
    writer.set(false);
    assert_eq!(gate.value(), Some(false));
}

/// Validates many concurrent readers are all released by a single set.
#[tokio::test]
async fn test_concurrent_readers_released_together() {
    let (writer, gate) = init_gate::<String>();

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait_ready(Duration::from_secs(2)).await })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(10)).await;
    writer.set("loaded".to_string());

    for result in futures::future::join_all(readers).await {
        assert_eq!(result.expect("join"), GateRead::Ready("loaded".to_string()));
    }
}
