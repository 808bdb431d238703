//! Error types used throughout the agent

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Gasoline
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum GasolineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Messaging error: {0}")]
    Messaging(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Gasoline operations
pub type Result<T> = std::result::Result<T, GasolineError>;

impl From<serde_json::Error> for GasolineError {
    fn from(err: serde_json::Error) -> Self {
        GasolineError::InvalidInput(err.to_string())
    }
}
