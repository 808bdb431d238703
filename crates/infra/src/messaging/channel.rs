//! mpsc + oneshot request/response bridge
//!
//! [`ChannelMessenger`] is the sending half handed to handlers; whichever
//! task plays the target contexts owns the [`ContextEndpoint`] and answers
//! each [`ContextRequest`] exactly once.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use gasoline_core::ContextMessenger;
use gasoline_domain::{GasolineError, Result};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Build a connected messenger/endpoint pair.
///
/// `capacity` bounds requests waiting for the endpoint; `timeout` bounds each
/// request from enqueue to reply.
pub fn context_channel(capacity: usize, timeout: Duration) -> (ChannelMessenger, ContextEndpoint) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelMessenger { tx, timeout }, ContextEndpoint { rx })
}

/// One message awaiting a reply
#[derive(Debug)]
pub struct ContextRequest {
    pub target: String,
    pub message: Value,
    reply: oneshot::Sender<Result<Value>>,
}

impl ContextRequest {
    /// Answer the request. A requester that already gave up is ignored.
    pub fn respond(self, reply: Result<Value>) {
        if self.reply.send(reply).is_err() {
            debug!(context = %self.target, "requester gone before reply");
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelMessenger {
    tx: mpsc::Sender<ContextRequest>,
    timeout: Duration,
}

#[async_trait]
impl ContextMessenger for ChannelMessenger {
    async fn send(&self, target: &str, message: Value) -> Result<Value> {
        let (reply, response) = oneshot::channel();
        let request = ContextRequest { target: target.to_string(), message, reply };

        let exchange = async {
            if self.tx.send(request).await.is_err() {
                return Err(GasolineError::Messaging(format!("context {target} is not listening")));
            }
            match response.await {
                Ok(reply) => reply,
                Err(_) => {
                    Err(GasolineError::Messaging(format!("context {target} dropped the request")))
                }
            }
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    context = target,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "context request timed out"
                );
                Err(GasolineError::Timeout(format!("no reply from {target} within {:?}", self.timeout)))
            }
        }
    }
}

/// Receiving half
#[derive(Debug)]
pub struct ContextEndpoint {
    rx: mpsc::Receiver<ContextRequest>,
}

impl ContextEndpoint {
    /// Next request; `None` once every messenger is dropped.
    pub async fn recv(&mut self) -> Option<ContextRequest> {
        self.rx.recv().await
    }

    /// Answer every request with `handler` until all messengers are gone.
    ///
    /// Requests are served one at a time, in arrival order.
    pub async fn serve<F, Fut>(mut self, handler: F)
    where
        F: Fn(String, Value) -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        while let Some(request) = self.recv().await {
            let reply = handler(request.target.clone(), request.message.clone()).await;
            request.respond(reply);
        }
        debug!("context endpoint closed");
    }
}
