//! Integration tests for the circuit breaker
//!
//! Exercises the breaker with real timers and with the mock clock, covering
//! the open/half-open/closed cycle end to end.

#![cfg(feature = "runtime")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gasoline_common::resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, MockClock, ResilienceError,
};

/// Custom error type for testing
#[derive(Debug, Clone)]
struct TestError {
    message: String,
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TestError {}

fn failing() -> Result<(), TestError> {
    Err(TestError { message: "server down".to_string() })
}

/// Validates the open threshold with a breaker configured for two failures.
///
/// # Test Steps
/// 1. Configure `max_failures = 2`
/// 2. Fail twice; the breaker reports `open`
/// 3. A third call is rejected as `CircuitOpen`
/// 4. The wrapped function is never invoked for the third call
#[tokio::test]
async fn test_breaker_opens_after_two_failures() {
    let config = CircuitBreakerConfig::new()
        .max_failures(2)
        .initial_backoff(Duration::from_millis(1))
        .build()
        .expect("valid config");
    let breaker = CircuitBreaker::new(config).expect("breaker");

    let invocations = Arc::new(AtomicU32::new(0));
    for _ in 0..2 {
        let invocations = Arc::clone(&invocations);
        let result = breaker
            .execute(|| async move {
                invocations.fetch_add(1, Ordering::SeqCst);
                failing()
            })
            .await;
        assert!(matches!(result, Err(ResilienceError::OperationFailed { .. })));
    }
    assert_eq!(breaker.get_state(), CircuitState::Open);

    let third = {
        let invocations = Arc::clone(&invocations);
        breaker
            .execute(|| async move {
                invocations.fetch_add(1, Ordering::SeqCst);
                failing()
            })
            .await
    };

    match third {
        Err(err @ ResilienceError::CircuitOpen { .. }) => assert!(err.is_rejection()),
        other => panic!("expected CircuitOpen, got {other:?}"),
    }
    assert_eq!(invocations.load(Ordering::SeqCst), 2);
}

/// Validates recovery with real time: after the reset timeout elapses the
/// breaker is half-open and a successful call closes it.
///
/// # Test Steps
/// 1. Configure `reset_timeout = 50ms`, `max_failures = 2`
/// 2. Fail twice to open the breaker
/// 3. Sleep 60ms; state is half-open
/// 4. A successful call closes the breaker and zeroes consecutive failures
#[tokio::test]
async fn test_breaker_recovers_after_reset_timeout() {
    let config = CircuitBreakerConfig::new()
        .max_failures(2)
        .reset_timeout(Duration::from_millis(50))
        .initial_backoff(Duration::from_millis(1))
        .max_backoff(Duration::from_millis(5))
        .build()
        .expect("valid config");
    let breaker = CircuitBreaker::new(config).expect("breaker");

    let _ = breaker.execute(|| async { failing() }).await;
    let _ = breaker.execute(|| async { failing() }).await;
    assert_eq!(breaker.get_state(), CircuitState::Open);
    assert!(breaker.retry_after() > Duration::ZERO);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(breaker.get_state(), CircuitState::HalfOpen);

    breaker.execute(|| async { Ok::<_, TestError>(()) }).await.expect("probe succeeds");

    let stats = breaker.stats();
    assert_eq!(stats.state, CircuitState::Closed);
    assert_eq!(stats.consecutive_failures, 0);
    assert_eq!(stats.total_failures, 2);
    assert_eq!(stats.total_successes, 1);
}

/// Validates that the configured backoff is actually slept before the call.
#[tokio::test]
async fn test_backoff_delays_the_next_call() {
    let config = CircuitBreakerConfig::new()
        .max_failures(10)
        .initial_backoff(Duration::from_millis(30))
        .max_backoff(Duration::from_millis(30))
        .build()
        .expect("valid config");
    let breaker = CircuitBreaker::new(config).expect("breaker");

    let _ = breaker.execute(|| async { failing() }).await;
    let _ = breaker.execute(|| async { failing() }).await;
    assert_eq!(breaker.stats().current_backoff, Duration::from_millis(30));

    let started = tokio::time::Instant::now();
    breaker.execute(|| async { Ok::<_, TestError>(()) }).await.expect("success");
    assert!(started.elapsed() >= Duration::from_millis(30));
    assert_eq!(breaker.stats().current_backoff, Duration::ZERO);
}

/// Validates a full outage and recovery cycle with the mock clock, including
/// a failed probe that sends the breaker back to open.
#[tokio::test]
async fn test_outage_cycle_with_mock_clock() {
    let clock = MockClock::new();
    let config = CircuitBreakerConfig {
        max_failures: 3,
        reset_timeout: Duration::from_secs(30),
        initial_backoff: Duration::ZERO,
        max_backoff: Duration::ZERO,
    };
    let breaker = CircuitBreaker::with_clock(config, clock.clone());

    for _ in 0..3 {
        let _ = breaker.execute(|| async { failing() }).await;
    }
    assert_eq!(breaker.get_state(), CircuitState::Open);

    clock.advance(Duration::from_secs(10));
    assert_eq!(breaker.get_state(), CircuitState::Open);
    assert_eq!(breaker.retry_after(), Duration::from_secs(20));

    clock.advance(Duration::from_secs(20));
    assert_eq!(breaker.get_state(), CircuitState::HalfOpen);
    let _ = breaker.execute(|| async { failing() }).await;
    assert_eq!(breaker.get_state(), CircuitState::Open);

    clock.advance(Duration::from_secs(30));
    breaker.execute(|| async { Ok::<_, TestError>(()) }).await.expect("probe succeeds");
    assert_eq!(breaker.get_state(), CircuitState::Closed);
    assert_eq!(breaker.stats().total_failures, 4);
}
