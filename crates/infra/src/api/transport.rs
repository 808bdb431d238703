//! reqwest-backed [`SyncTransport`]

use std::time::Duration;

use async_trait::async_trait;
use gasoline_core::SyncTransport;
use gasoline_domain::constants::{
    CLIENT_HEADER, CLIENT_NAME, EXTENSION_VERSION_HEADER, SYNC_PATH,
};
use gasoline_domain::{Result, ServerConfig, SyncRequest, SyncResponse};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};
use url::Url;

use super::errors::TransportError;

/// Posts sync requests to `<server>/sync`.
#[derive(Debug, Clone)]
pub struct HttpSyncTransport {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpSyncTransport {
    /// Build a transport for the configured server.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] if the server URL does not parse or
    /// the version cannot be sent as a header value.
    pub fn new(server: &ServerConfig) -> std::result::Result<Self, TransportError> {
        let base = Url::parse(server.url.trim())
            .map_err(|e| TransportError::Config(format!("invalid server url: {e}")))?;
        let endpoint = base
            .join(SYNC_PATH)
            .map_err(|e| TransportError::Config(format!("invalid sync endpoint: {e}")))?;

        let version = server.extension_version.as_str();
        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_HEADER, header_value(&format!("{CLIENT_NAME}/{version}"))?);
        headers.insert(EXTENSION_VERSION_HEADER, header_value(version)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self { client, endpoint, timeout: server.request_timeout() })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// One request/response exchange.
    #[instrument(skip(self, request), fields(
        session_id = %request.session_id,
        results = request.command_results.len(),
        logs = request.extension_logs.len(),
    ))]
    pub async fn send(
        &self,
        request: &SyncRequest,
    ) -> std::result::Result<SyncResponse, TransportError> {
        let call = self.client.post(self.endpoint.clone()).json(request).send();
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return Err(map_reqwest_error(err, self.timeout)),
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "sync request timed out");
                return Err(TransportError::Timeout(self.timeout));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, body));
        }

        let parsed = response
            .json::<SyncResponse>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        debug!(
            commands = parsed.commands.len(),
            next_poll_ms = parsed.next_poll_ms,
            "sync response received"
        );
        Ok(parsed)
    }
}

#[async_trait]
impl SyncTransport for HttpSyncTransport {
    async fn sync(&self, request: &SyncRequest) -> Result<SyncResponse> {
        self.send(request).await.map_err(Into::into)
    }
}

fn header_value(value: &str) -> std::result::Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value)
        .map_err(|e| TransportError::Config(format!("invalid header value {value:?}: {e}")))
}

fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}

fn map_status_error(status: StatusCode, body: String) -> TransportError {
    let message = if body.is_empty() {
        status.canonical_reason().unwrap_or("unexpected status").to_string()
    } else {
        body
    };

    if status == StatusCode::TOO_MANY_REQUESTS {
        TransportError::RateLimit(message)
    } else if status.is_server_error() {
        TransportError::Server { status: status.as_u16(), message }
    } else if status.is_client_error() {
        TransportError::Client { status: status.as_u16(), message }
    } else {
        TransportError::Network(format!("unexpected status {status}: {message}"))
    }
}
