//! Transport error types
//!
//! Classifies `/sync` failures so callers can tell a down server from a
//! misbehaving one.

use std::time::Duration;

use gasoline_domain::GasolineError;
use thiserror::Error;

/// Categories of transport errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorCategory {
    /// Connection refused, reset, or timed out - retryable
    Network,
    /// Server errors (5xx) - retryable
    Server,
    /// Rate limiting (429) - retryable
    RateLimit,
    /// Client errors (4xx) - non-retryable until the client changes
    Client,
    /// Response body was not a sync response
    Decode,
    /// Bad base URL or client construction failure
    Config,
}

/// Errors produced by [`HttpSyncTransport`](super::HttpSyncTransport)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Client error ({status}): {message}")]
    Client { status: u16, message: String },

    #[error("Invalid sync response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TransportError {
    pub fn category(&self) -> TransportErrorCategory {
        match self {
            Self::Network(_) | Self::Timeout(_) => TransportErrorCategory::Network,
            Self::Server { .. } => TransportErrorCategory::Server,
            Self::RateLimit(_) => TransportErrorCategory::RateLimit,
            Self::Client { .. } => TransportErrorCategory::Client,
            Self::Decode(_) => TransportErrorCategory::Decode,
            Self::Config(_) => TransportErrorCategory::Config,
        }
    }

    /// Whether the same request may succeed later without any change
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            TransportErrorCategory::Network
                | TransportErrorCategory::Server
                | TransportErrorCategory::RateLimit
        )
    }
}

impl From<TransportError> for GasolineError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(_) => GasolineError::Timeout(err.to_string()),
            TransportError::Config(message) => GasolineError::Config(message),
            other => GasolineError::Network(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            TransportError::Network("refused".into()).category(),
            TransportErrorCategory::Network
        );
        assert_eq!(
            TransportError::Timeout(Duration::from_secs(1)).category(),
            TransportErrorCategory::Network
        );
        assert_eq!(
            TransportError::Server { status: 502, message: "bad gateway".into() }.category(),
            TransportErrorCategory::Server
        );
        assert_eq!(
            TransportError::Client { status: 403, message: "forbidden".into() }.category(),
            TransportErrorCategory::Client
        );
    }

    #[test]
    fn test_should_retry() {
        assert!(TransportError::Network("refused".into()).should_retry());
        assert!(TransportError::RateLimit("slow down".into()).should_retry());
        assert!(TransportError::Server { status: 500, message: String::new() }.should_retry());
        assert!(!TransportError::Client { status: 400, message: String::new() }.should_retry());
        assert!(!TransportError::Decode("eof".into()).should_retry());
        assert!(!TransportError::Config("bad url".into()).should_retry());
    }

    #[test]
    fn test_domain_conversion() {
        let err: GasolineError = TransportError::Timeout(Duration::from_millis(10)).into();
        assert!(matches!(err, GasolineError::Timeout(_)));

        let err: GasolineError = TransportError::Network("refused".into()).into();
        assert!(matches!(err, GasolineError::Network(msg) if msg.contains("refused")));

        let err: GasolineError = TransportError::Config("bad url".into()).into();
        assert_eq!(err, GasolineError::Config("bad url".into()));
    }
}
