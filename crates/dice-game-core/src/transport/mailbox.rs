//! Single-slot handoff between the inbound listener and the session.

use super::traits::TransportError;
use crate::protocol::{Envelope, MessageKind};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// One bounded slot of capacity one
struct Slot {
    tx: mpsc::Sender<Envelope>,
    rx: Mutex<mpsc::Receiver<Envelope>>,
}

impl Slot {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }
}

/// Inbound messages waiting for the active round, one slot per kind.
///
/// The producer (listener) never blocks: a second message of a kind whose
/// slot is still full is refused. The consumer (session) blocks until the
/// slot it asks for is filled.
pub struct Mailbox {
    slots: [Slot; 4],
    closed: AtomicBool,
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Put an inbound envelope in the slot for its kind
    pub fn deposit(&self, envelope: Envelope) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let kind = envelope.kind();
        let round = envelope.round;
        self.slots[kind.index()]
            .tx
            .try_send(envelope)
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => TransportError::SlotOccupied(kind),
                mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
            })?;
        debug!(%kind, round, "message deposited");
        Ok(())
    }

    /// Wait for the envelope in the slot for `kind`
    pub async fn take(&self, kind: MessageKind) -> Result<Envelope, TransportError> {
        let mut rx = self.slots[kind.index()].rx.lock().await;
        rx.recv().await.ok_or(TransportError::Closed)
    }

    /// Refuse further deposits
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}
