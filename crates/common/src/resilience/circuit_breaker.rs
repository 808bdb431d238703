//! Circuit breaker with a single-probe half-open state and exponential backoff
//!
//! The breaker wraps an async operation and tracks its outcomes. After
//! `max_failures` consecutive failures it opens and rejects every call without
//! invoking the operation. Once `reset_timeout` has elapsed it moves to
//! half-open and lets exactly one probe through: a successful probe closes the
//! circuit, a failed one re-opens it.
//!
//! While closed, consecutive failures also grow a backoff that is slept before
//! the next invocation. The first failure leaves the backoff at zero, the
//! second sets it to `initial_backoff`, and each later failure doubles it up to
//! `max_backoff`. Any success resets it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

//==============================================================================
// Time Abstraction for Testability
//==============================================================================

/// Trait for time operations to enable deterministic testing
///
/// The breaker reads the clock to decide when an open circuit may be probed.
/// Production code uses [`SystemClock`]; tests drive a [`MockClock`] forward
/// instead of sleeping through the reset timeout.
pub trait Clock: Send + Sync + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get current system time (wall clock)
    fn system_time(&self) -> SystemTime;

    /// Get milliseconds since UNIX epoch
    fn millis_since_epoch(&self) -> u64 {
        self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn system_time(&self) -> SystemTime {
        (**self).system_time()
    }
}

/// Mock clock for deterministic testing
///
/// Clones share the same elapsed counter, so a test can keep one handle and
/// hand another to the breaker.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a new mock clock starting at the current instant
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Advance the mock clock by milliseconds (convenience method)
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Get the current elapsed time
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + self.elapsed()
    }
}

//==============================================================================
// Error Types
//==============================================================================

/// Configuration validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Errors that can occur in resilience operations
///
/// Generic over the operation's error type so the original failure is kept
/// intact inside [`ResilienceError::OperationFailed`].
#[derive(Debug, Error)]
pub enum ResilienceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Circuit breaker is open, rejecting calls
    #[error("Circuit breaker is open, rejecting calls (retry in {retry_after:?})")]
    CircuitOpen { retry_after: Duration },

    /// Circuit is half-open and its single probe has not finished yet
    #[error("Circuit breaker probe already in flight")]
    ProbeInFlight,

    /// The underlying operation failed
    #[error("Operation failed: {source}")]
    OperationFailed {
        #[source]
        source: E,
    },
}

impl<E> ResilienceError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Returns `true` when the breaker refused the call without running it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. } | Self::ProbeInFlight)
    }

    /// Returns the operation error, if the operation actually ran and failed.
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::OperationFailed { source } => Some(source),
            _ => None,
        }
    }
}

/// Result type for resilience operations
pub type ResilienceResult<T, E> = Result<T, ResilienceError<E>>;

/// Configuration result type using simple config errors
pub type ConfigResult<T> = Result<T, ConfigError>;

//==============================================================================
// State and Configuration
//==============================================================================

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    /// Circuit is closed, allowing requests
    Closed,
    /// Circuit is open, rejecting requests
    Open,
    /// Circuit is half-open, allowing one probe request
    HalfOpen,
}

impl CircuitState {
    /// Lowercase wire name used in status reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub max_failures: u64,
    /// Time to wait before an open circuit allows a probe
    pub reset_timeout: Duration,
    /// Backoff applied after the second consecutive failure
    pub initial_backoff: Duration,
    /// Upper bound for the doubling backoff
    pub max_backoff: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            reset_timeout: Duration::from_secs(30),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration builder
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Create a configuration builder (alias for `new()`)
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_failures == 0 {
            return Err(ConfigError::Invalid {
                message: "max_failures must be greater than 0".to_string(),
            });
        }

        if self.max_backoff < self.initial_backoff {
            return Err(ConfigError::Invalid {
                message: "max_backoff must not be smaller than initial_backoff".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for CircuitBreakerConfig
#[derive(Debug)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self { config: CircuitBreakerConfig::default() }
    }

    pub fn max_failures(mut self, max_failures: u64) -> Self {
        self.config.max_failures = max_failures;
        self
    }

    pub fn reset_timeout(mut self, timeout: Duration) -> Self {
        self.config.reset_timeout = timeout;
        self
    }

    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.config.initial_backoff = backoff;
        self
    }

    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.config.max_backoff = backoff;
        self
    }

    pub fn build(self) -> ConfigResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Point-in-time snapshot of the breaker counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub consecutive_failures: u64,
    pub total_failures: u64,
    pub total_successes: u64,
    pub current_backoff: Duration,
    pub probe_in_flight: bool,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u64,
    total_failures: u64,
    total_successes: u64,
    current_backoff: Duration,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            total_failures: 0,
            total_successes: 0,
            current_backoff: Duration::ZERO,
            opened_at: None,
            probe_in_flight: false,
        }
    }
}

/// Permission to run one operation, handed out under the state lock.
#[derive(Debug, Clone, Copy)]
struct Permit {
    backoff: Duration,
    probe: bool,
}

#[derive(Debug, Clone, Copy)]
enum Rejection {
    Open(Duration),
    ProbeInFlight,
}

//==============================================================================
// Circuit Breaker
//==============================================================================

/// Async circuit breaker
///
/// Cloning is cheap; clones share state.
///
/// # Examples
///
/// ```rust
/// use gasoline_common::resilience::{CircuitBreaker, CircuitState};
///
/// # async fn example() {
/// let breaker = CircuitBreaker::default();
/// let value: Result<u32, _> =
///     breaker.execute(|| async { Ok::<_, std::io::Error>(7) }).await;
/// assert_eq!(value.ok(), Some(7));
/// assert_eq!(breaker.get_state(), CircuitState::Closed);
/// # }
/// ```
#[derive(Clone)]
pub struct CircuitBreaker<C: Clock = SystemClock> {
    config: CircuitBreakerConfig,
    inner: Arc<Mutex<BreakerState>>,
    clock: Arc<C>,
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for CircuitBreaker<SystemClock> {
    fn default() -> Self {
        Self::with_clock(CircuitBreakerConfig::default(), SystemClock)
    }
}

impl CircuitBreaker<SystemClock> {
    /// Create a breaker using the system clock
    pub fn new(config: CircuitBreakerConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::with_clock(config, SystemClock))
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a breaker with an explicit clock.
    ///
    /// The configuration is trusted as-is; call
    /// [`CircuitBreakerConfig::validate`] first when it comes from user input.
    pub fn with_clock(config: CircuitBreakerConfig, clock: C) -> Self {
        Self { config, inner: Arc::new(Mutex::new(BreakerState::closed())), clock: Arc::new(clock) }
    }

    /// Configuration this breaker was built with
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Run `operation` under the breaker.
    ///
    /// Open circuits reject without invoking the operation. Otherwise the
    /// current backoff is slept first, then the operation runs and its outcome
    /// updates the counters. If the returned future is dropped while a
    /// half-open probe is running, the probe slot is released.
    #[instrument(skip(self, operation), fields(state))]
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> ResilienceResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let permit = match self.acquire() {
            Ok(permit) => permit,
            Err(Rejection::Open(retry_after)) => {
                debug!(?retry_after, "circuit open, rejecting call");
                return Err(ResilienceError::CircuitOpen { retry_after });
            }
            Err(Rejection::ProbeInFlight) => {
                debug!("half-open probe already in flight, rejecting call");
                return Err(ResilienceError::ProbeInFlight);
            }
        };

        let mut guard = ProbeGuard { breaker: self, armed: permit.probe };

        if !permit.backoff.is_zero() {
            debug!(backoff_ms = permit.backoff.as_millis() as u64, "backing off before call");
            tokio::time::sleep(permit.backoff).await;
        }

        let outcome = operation().await;
        guard.armed = false;

        match outcome {
            Ok(value) => {
                self.on_success(permit.probe);
                Ok(value)
            }
            Err(source) => {
                self.on_failure(permit.probe);
                Err(ResilienceError::OperationFailed { source })
            }
        }
    }

    /// Current state, applying the open to half-open transition when the
    /// reset timeout has elapsed.
    pub fn get_state(&self) -> CircuitState {
        let mut st = self.inner.lock();
        self.refresh(&mut st);
        st.state
    }

    /// Whether a call made now could reach the operation
    pub fn is_available(&self) -> bool {
        let mut st = self.inner.lock();
        self.refresh(&mut st);
        match st.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => !st.probe_in_flight,
            CircuitState::Open => false,
        }
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CircuitBreakerStats {
        let mut st = self.inner.lock();
        self.refresh(&mut st);
        CircuitBreakerStats {
            state: st.state,
            consecutive_failures: st.consecutive_failures,
            total_failures: st.total_failures,
            total_successes: st.total_successes,
            current_backoff: st.current_backoff,
            probe_in_flight: st.probe_in_flight,
        }
    }

    /// Time left before an open circuit admits a probe. Zero unless open.
    pub fn retry_after(&self) -> Duration {
        let mut st = self.inner.lock();
        self.refresh(&mut st);
        self.remaining_open(&st)
    }

    /// Force the breaker closed and zero every counter
    pub fn reset(&self) {
        let mut st = self.inner.lock();
        *st = BreakerState::closed();
        info!("circuit breaker reset");
    }

    fn acquire(&self) -> Result<Permit, Rejection> {
        let mut st = self.inner.lock();
        self.refresh(&mut st);
        tracing::Span::current().record("state", st.state.as_str());

        match st.state {
            CircuitState::Open => Err(Rejection::Open(self.remaining_open(&st))),
            CircuitState::HalfOpen if st.probe_in_flight => Err(Rejection::ProbeInFlight),
            CircuitState::HalfOpen => {
                st.probe_in_flight = true;
                Ok(Permit { backoff: st.current_backoff, probe: true })
            }
            CircuitState::Closed => Ok(Permit { backoff: st.current_backoff, probe: false }),
        }
    }

    fn refresh(&self, st: &mut BreakerState) {
        if st.state != CircuitState::Open {
            return;
        }
        let elapsed = st.opened_at.map(|at| self.clock.now().saturating_duration_since(at));
        if elapsed.map_or(true, |elapsed| elapsed >= self.config.reset_timeout) {
            st.state = CircuitState::HalfOpen;
            st.probe_in_flight = false;
            info!("circuit breaker half-open, next call probes");
        }
    }

    fn remaining_open(&self, st: &BreakerState) -> Duration {
        if st.state != CircuitState::Open {
            return Duration::ZERO;
        }
        st.opened_at
            .map(|at| {
                let elapsed = self.clock.now().saturating_duration_since(at);
                self.config.reset_timeout.saturating_sub(elapsed)
            })
            .unwrap_or(Duration::ZERO)
    }

    fn on_success(&self, probe: bool) {
        let mut st = self.inner.lock();
        st.consecutive_failures = 0;
        st.current_backoff = Duration::ZERO;
        st.total_successes += 1;
        if probe {
            st.probe_in_flight = false;
        }
        if st.state == CircuitState::HalfOpen {
            st.state = CircuitState::Closed;
            st.opened_at = None;
            info!("circuit breaker closed after successful probe");
        }
    }

    fn on_failure(&self, probe: bool) {
        let mut st = self.inner.lock();
        st.consecutive_failures += 1;
        st.total_failures += 1;
        if probe {
            st.probe_in_flight = false;
        }

        if st.consecutive_failures >= 2 {
            st.current_backoff = if st.current_backoff.is_zero() {
                self.config.initial_backoff
            } else {
                st.current_backoff.saturating_mul(2).min(self.config.max_backoff)
            };
        }

        match st.state {
            CircuitState::HalfOpen => {
                st.state = CircuitState::Open;
                st.opened_at = Some(self.clock.now());
                warn!(
                    consecutive_failures = st.consecutive_failures,
                    "probe failed, circuit breaker re-opened"
                );
            }
            CircuitState::Closed if st.consecutive_failures >= self.config.max_failures => {
                st.state = CircuitState::Open;
                st.opened_at = Some(self.clock.now());
                warn!(
                    consecutive_failures = st.consecutive_failures,
                    reset_timeout_ms = self.config.reset_timeout.as_millis() as u64,
                    "circuit breaker opened"
                );
            }
            _ => {}
        }
    }
}

/// Releases the half-open probe slot if the probe's future is dropped early.
struct ProbeGuard<'a, C: Clock> {
    breaker: &'a CircuitBreaker<C>,
    armed: bool,
}

impl<C: Clock> Drop for ProbeGuard<'_, C> {
    fn drop(&mut self) {
        if self.armed {
            let mut st = self.breaker.inner.lock();
            st.probe_in_flight = false;
            debug!("half-open probe cancelled, slot released");
        }
    }
}
