//! Page context stand-in for a process with no browser attached
//!
//! Every relayed command gets a handled failure, so the server sees a
//! prompt `error` result instead of a handler timeout.

use gasoline_infra::ContextEndpoint;
use serde_json::json;
use tracing::debug;

/// Error reported for page and browser commands when no context is attached
pub const PAGE_CONTEXT_UNAVAILABLE: &str = "page_context_unavailable";

/// Answer every request on `endpoint` until all messengers are dropped.
pub async fn serve_headless(endpoint: ContextEndpoint) {
    endpoint
        .serve(|target, message| async move {
            debug!(context = %target, command_type = %message["type"], "no context attached");
            Ok(json!({"success": false, "error": PAGE_CONTEXT_UNAVAILABLE}))
        })
        .await;
}
