//! Sync client error types

use std::time::Duration;

use gasoline_common::resilience::ConfigError;
use gasoline_domain::GasolineError;
use thiserror::Error;

/// Lifecycle errors of [`SyncClient`](super::SyncClient)
#[derive(Debug, Error)]
pub enum SyncClientError {
    /// Breaker settings rejected
    #[error("Invalid circuit breaker configuration: {0}")]
    Breaker(#[from] ConfigError),

    /// The loop did not finish within the stop timeout and was aborted
    #[error("Sync loop did not stop within {timeout:?}")]
    StopTimeout { timeout: Duration },

    /// The loop task panicked
    #[error("Sync loop task failed: {0}")]
    TaskJoinFailed(String),
}

impl From<SyncClientError> for GasolineError {
    fn from(err: SyncClientError) -> Self {
        match err {
            SyncClientError::Breaker(_) => GasolineError::Config(err.to_string()),
            SyncClientError::StopTimeout { .. } => GasolineError::Timeout(err.to_string()),
            SyncClientError::TaskJoinFailed(_) => GasolineError::Internal(err.to_string()),
        }
    }
}

/// Convenience type alias for sync client operations
pub type SyncClientResult<T> = Result<T, SyncClientError>;
