//! Cross-context request/response port.
//!
//! Some handlers need a reply from another execution context (a page's
//! content script, for example). The transport is opaque to the protocol.

use async_trait::async_trait;
use gasoline_domain::Result;
use serde_json::Value;

/// Port for sending one message to a target context and awaiting its reply.
#[async_trait]
pub trait ContextMessenger: Send + Sync {
    /// Deliver `message` to `target` and wait for the response.
    ///
    /// Implementations bound the wait and report an expired wait as
    /// `GasolineError::Timeout`.
    async fn send(&self, target: &str, message: Value) -> Result<Value>;
}
