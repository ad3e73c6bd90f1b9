//! Channels to the background worker.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, instrument};
use url::Url;

use inbrowser_core::error::{GatewayError, Result};
use inbrowser_core::traits::WorkerChannel;
use inbrowser_core::types::SyncMessage;

/// Default request timeout for the HTTP worker channel.
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

// ═══════════════════════════════════════════════════════════════════════════════
// IN-PROCESS
// ═══════════════════════════════════════════════════════════════════════════════

/// Fire-and-forget channel to a worker running in the same process.
///
/// `send` returns as soon as the message is queued.
#[derive(Clone, Debug)]
pub struct LocalWorkerChannel {
    tx: mpsc::UnboundedSender<SyncMessage>,
}

impl LocalWorkerChannel {
    /// Creates a channel and the receiver the worker listens on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SyncMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl WorkerChannel for LocalWorkerChannel {
    async fn send(&self, message: SyncMessage) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| GatewayError::WorkerUnavailable("worker is not listening".into()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP
// ═══════════════════════════════════════════════════════════════════════════════

/// Request/response channel to a worker's HTTP control endpoint.
///
/// Each message is POSTed as its JSON envelope. `send` returns once the
/// worker answered; any non-2xx status is an error.
pub struct HttpWorkerChannel {
    endpoint: Url,
    http_client: reqwest::Client,
}

impl HttpWorkerChannel {
    /// Creates a channel with the default request timeout.
    pub fn new(endpoint: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| GatewayError::HttpError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self::with_client(Url::parse(endpoint)?, http_client))
    }

    /// Creates a channel over a preconfigured client.
    pub fn with_client(endpoint: Url, http_client: reqwest::Client) -> Self {
        Self {
            endpoint,
            http_client,
        }
    }

    /// Returns the control endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl WorkerChannel for HttpWorkerChannel {
    #[instrument(skip(self, message), fields(endpoint = %self.endpoint, action = ?message.action))]
    async fn send(&self, message: SyncMessage) -> Result<()> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&message)
            .send()
            .await
            .map_err(|e| GatewayError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::HttpError(format!(
                "Worker answered with status {}: {}",
                status, text
            )));
        }

        debug!("Worker acknowledged");
        Ok(())
    }
}
