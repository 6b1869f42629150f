//! In-memory transport for tests and the single-process demo.

use super::mailbox::Mailbox;
use super::traits::{Transport, TransportError};
use crate::protocol::{Envelope, MessageKind};
use async_trait::async_trait;
use std::sync::Arc;

/// One end of an in-process link between two players
#[derive(Clone)]
pub struct MemoryTransport {
    inbox: Arc<Mailbox>,
    peer_inbox: Arc<Mailbox>,
}

impl MemoryTransport {
    /// Create two connected endpoints
    pub fn pair() -> (Self, Self) {
        let a = Arc::new(Mailbox::new());
        let b = Arc::new(Mailbox::new());
        (
            Self {
                inbox: a.clone(),
                peer_inbox: b.clone(),
            },
            Self {
                inbox: b,
                peer_inbox: a,
            },
        )
    }

    /// Our own inbox, for tests that inject messages directly
    pub fn inbox(&self) -> &Arc<Mailbox> {
        &self.inbox
    }

    /// Stop accepting messages from the peer
    pub fn close(&self) {
        self.inbox.close();
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, envelope: Envelope) -> Result<(), TransportError> {
        self.peer_inbox.deposit(envelope)
    }

    async fn recv(&self, kind: MessageKind) -> Result<Envelope, TransportError> {
        self.inbox.take(kind).await
    }
}
