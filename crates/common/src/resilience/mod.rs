//! Resilience patterns for fault tolerance
//!
//! Currently a single pattern: the [`CircuitBreaker`], which guards the sync
//! transport against hammering a dev server that is down or restarting.
//!
//! The breaker is generic over the operation's error type and over a
//! [`Clock`], so callers keep their own error enums and tests can drive
//! reset timeouts with a [`MockClock`] instead of sleeping.

pub mod circuit_breaker;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitBreakerStats,
    CircuitState, Clock, ConfigError, ConfigResult, MockClock, ResilienceError, ResilienceResult,
    SystemClock,
};
