//! HTTP transport between two peer processes.
//!
//! Outbound envelopes are POSTed as JSON to the peer's `/messages` endpoint.
//! Inbound envelopes arrive at our own listener, which deposits them into
//! the shared [`Mailbox`]; `recv` reads from there.

use super::mailbox::Mailbox;
use super::traits::{Transport, TransportError};
use crate::protocol::{Envelope, MessageKind};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Header carrying the optional pre-shared peer token
pub const PEER_TOKEN_HEADER: &str = "x-peer-token";

/// Delay between readiness probes
const PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on a single readiness probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// HTTP link to a remote player
pub struct HttpTransport {
    /// HTTP client
    client: Client,
    /// Peer base URL, e.g. `http://localhost:50052`
    peer_url: String,
    /// Inbound messages, filled by our listener
    inbox: Arc<Mailbox>,
    /// Token sent with every message, if the peer requires one
    token: Option<String>,
}

impl HttpTransport {
    /// Create a transport to `peer_url` reading inbound messages from `inbox`
    pub fn new(peer_url: impl Into<String>, inbox: Arc<Mailbox>) -> Self {
        Self {
            client: Client::new(),
            peer_url: peer_url.into().trim_end_matches('/').to_string(),
            inbox,
            token: None,
        }
    }

    /// Attach the pre-shared peer token to every outbound message
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn peer_url(&self) -> &str {
        &self.peer_url
    }

    pub fn inbox(&self) -> &Arc<Mailbox> {
        &self.inbox
    }

    /// Poll the peer's `/health` endpoint until it answers or `timeout` passes
    pub async fn wait_for_peer(&self, timeout: Duration) -> Result<(), TransportError> {
        let url = format!("{}/health", self.peer_url);
        let start = Instant::now();

        while start.elapsed() < timeout {
            match self.client.get(&url).timeout(PROBE_TIMEOUT).send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!("Peer at {} is up", self.peer_url);
                    return Ok(());
                }
                Ok(resp) => debug!("Peer not ready: status {}", resp.status()),
                Err(e) => debug!("Peer not ready: {}", e),
            }
            tokio::time::sleep(PROBE_INTERVAL).await;
        }
        Err(TransportError::Unreachable(timeout))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, envelope: Envelope) -> Result<(), TransportError> {
        let url = format!("{}/messages", self.peer_url);
        debug!(kind = %envelope.kind(), round = envelope.round, "POST {}", url);

        let mut request = self.client.post(&url).json(&envelope);
        if let Some(token) = &self.token {
            request = request.header(PEER_TOKEN_HEADER, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TransportError::Unauthorized);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    async fn recv(&self, kind: MessageKind) -> Result<Envelope, TransportError> {
        self.inbox.take(kind).await
    }
}
