//! Transport trait definition.

use crate::protocol::{Envelope, MessageKind};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from moving messages between peers
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Peer rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("A {0} message is already waiting to be consumed")]
    SlotOccupied(MessageKind),

    #[error("Channel closed")]
    Closed,

    #[error("Peer token missing or wrong")]
    Unauthorized,

    #[error("Peer unreachable after {0:?}")]
    Unreachable(std::time::Duration),
}

/// Trait for delivering protocol messages to the peer
///
/// Implementations must deliver each envelope once, in order, to the right
/// peer. Authentication of the peer is the implementation's business.
/// - MemoryTransport for tests and the single-process demo
/// - HttpTransport for two peer processes
#[async_trait]
pub trait Transport: Send + Sync {
    /// Hand an envelope to the peer
    async fn send(&self, envelope: Envelope) -> Result<(), TransportError>;

    /// Wait for the next inbound envelope of the given kind
    async fn recv(&self, kind: MessageKind) -> Result<Envelope, TransportError>;
}
