//! Commit-then-reveal state machine for a single round.

use super::messages::{Envelope, Message, MessageKind};
use super::types::{Role, RoundOutcome, RoundRecord};
use crate::crypto::{Blinding, Commitment, GroupParams};
use crate::dice::DieValue;
use crate::transport::{Transport, TransportError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that end a round, and with it the session
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Round {round}: transport failed: {source}")]
    Transport {
        round: u32,
        #[source]
        source: TransportError,
    },

    #[error("Round {round}: timed out waiting for {kind}")]
    Timeout { round: u32, kind: MessageKind },

    #[error("Round {round}: timed out sending {kind}")]
    SendTimeout { round: u32, kind: MessageKind },

    #[error("Round {round}: received {kind} for round {got}")]
    OutOfOrder {
        round: u32,
        kind: MessageKind,
        got: u32,
    },

    #[error("Round {round}: expected {expected}, got {got}")]
    UnexpectedMessage {
        round: u32,
        expected: MessageKind,
        got: MessageKind,
    },

    #[error("Round {round}: malformed message: {reason}")]
    Malformed { round: u32, reason: String },
}

impl ProtocolError {
    /// Round in which the error occurred
    pub fn round(&self) -> u32 {
        match self {
            ProtocolError::Transport { round, .. }
            | ProtocolError::Timeout { round, .. }
            | ProtocolError::SendTimeout { round, .. }
            | ProtocolError::OutOfOrder { round, .. }
            | ProtocolError::UnexpectedMessage { round, .. }
            | ProtocolError::Malformed { round, .. } => *round,
        }
    }
}

/// Position of a round in the commit-then-reveal exchange
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundState {
    Start,
    /// Committer: commitment sent, waiting for the throw
    CommitSent,
    /// Verifier: waiting for the commitment
    CommitAwaited,
    /// Committer: throw received, own die still hidden
    ThrowExchanged,
    /// Committer: opening sent, waiting for the acknowledgement
    OpeningSent,
    /// Verifier: throw sent, waiting for the opening
    OpeningAwaited,
    /// Verifier: opening checked
    Verified,
    Finished(RoundOutcome),
}

/// One round of the protocol, driven from either side.
///
/// The round owns its commitment and opening; nothing is retried; any
/// failure consumes the round.
pub struct RoundProtocol<'a, T: Transport + ?Sized> {
    transport: &'a T,
    params: &'a GroupParams,
    round: u32,
    timeout: Duration,
    state: RoundState,
}

impl<'a, T: Transport + ?Sized> RoundProtocol<'a, T> {
    pub fn new(transport: &'a T, params: &'a GroupParams, round: u32, timeout: Duration) -> Self {
        Self {
            transport,
            params,
            round,
            timeout,
            state: RoundState::Start,
        }
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Play the committer side with die `value` hidden under `blinding`
    pub async fn run_committer(
        &mut self,
        value: DieValue,
        blinding: Blinding,
    ) -> Result<RoundRecord, ProtocolError> {
        let commitment = self.params.commit(value, &blinding);
        info!("Sending commitment {}", commitment);
        self.send(Message::Commitment { c: commitment }).await?;
        self.state = RoundState::CommitSent;

        let peer = match self.receive(MessageKind::DieThrow).await? {
            Message::DieThrow { value } => DieValue::new(value)
                .map_err(|_| self.malformed(format!("die throw {} out of range", value)))?,
            other => return Err(self.unexpected(MessageKind::DieThrow, &other)),
        };
        info!("Received die throw {}", peer);
        self.state = RoundState::ThrowExchanged;

        info!("Sending opening (m: {}, r: {})", value, blinding);
        self.send(Message::Opening {
            value: value.get(),
            blinding,
        })
        .await?;
        self.state = RoundState::OpeningSent;

        let valid = match self.receive(MessageKind::Acknowledgement).await? {
            Message::Acknowledgement { valid } => valid,
            other => return Err(self.unexpected(MessageKind::Acknowledgement, &other)),
        };
        info!("Received acknowledgement: {}", valid);

        let outcome = if valid {
            RoundOutcome::judge(Role::Committer, value, peer)
        } else {
            warn!("Peer rejected our opening");
            RoundOutcome::cheat()
        };
        Ok(self.finish(Role::Committer, value, Some(peer), outcome))
    }

    /// Play the verifier side, throwing `value` once the commitment is in
    pub async fn run_verifier(&mut self, value: DieValue) -> Result<RoundRecord, ProtocolError> {
        self.state = RoundState::CommitAwaited;
        let commitment = match self.receive(MessageKind::Commitment).await? {
            Message::Commitment { c } => c,
            other => return Err(self.unexpected(MessageKind::Commitment, &other)),
        };
        if commitment.as_biguint() >= self.params.p() {
            return Err(self.malformed(format!("commitment {} not below p", commitment)));
        }
        info!("Received commitment {}", commitment);

        info!("Sending die throw {}", value);
        self.send(Message::DieThrow { value: value.get() }).await?;
        self.state = RoundState::OpeningAwaited;

        let (claimed, blinding) = match self.receive(MessageKind::Opening).await? {
            Message::Opening { value, blinding } => (value, blinding),
            other => return Err(self.unexpected(MessageKind::Opening, &other)),
        };
        info!("Received opening (m: {}, r: {})", claimed, blinding);

        let peer = self.check_opening(&commitment, claimed, &blinding);
        self.state = RoundState::Verified;

        self.send(Message::Acknowledgement {
            valid: peer.is_some(),
        })
        .await?;

        let outcome = match peer {
            Some(peer) => {
                info!("Commitment is valid");
                RoundOutcome::judge(Role::Verifier, value, peer)
            }
            None => {
                warn!("Opponent's opening does not match the commitment");
                RoundOutcome::cheat()
            }
        };
        Ok(self.finish(Role::Verifier, value, peer, outcome))
    }

    /// The opened die, if the opening is valid
    fn check_opening(
        &self,
        commitment: &Commitment,
        claimed: u64,
        blinding: &Blinding,
    ) -> Option<DieValue> {
        let value = DieValue::new(claimed).ok()?;
        self.params
            .verify(commitment, value, blinding)
            .then_some(value)
    }

    fn finish(
        &mut self,
        role: Role,
        own: DieValue,
        peer: Option<DieValue>,
        outcome: RoundOutcome,
    ) -> RoundRecord {
        self.state = RoundState::Finished(outcome);
        info!("Round {} result: {}", self.round, outcome);
        RoundRecord {
            round: self.round,
            role,
            own,
            peer,
            outcome,
        }
    }

    async fn send(&self, message: Message) -> Result<(), ProtocolError> {
        let kind = message.kind();
        tokio::time::timeout(
            self.timeout,
            self.transport.send(Envelope::new(self.round, message)),
        )
        .await
        .map_err(|_| ProtocolError::SendTimeout {
            round: self.round,
            kind,
        })?
        .map_err(|source| ProtocolError::Transport {
            round: self.round,
            source,
        })
    }

    async fn receive(&self, kind: MessageKind) -> Result<Message, ProtocolError> {
        debug!(%kind, "waiting");
        let envelope = tokio::time::timeout(self.timeout, self.transport.recv(kind))
            .await
            .map_err(|_| ProtocolError::Timeout {
                round: self.round,
                kind,
            })?
            .map_err(|source| ProtocolError::Transport {
                round: self.round,
                source,
            })?;

        if envelope.round != self.round {
            return Err(ProtocolError::OutOfOrder {
                round: self.round,
                kind,
                got: envelope.round,
            });
        }
        Ok(envelope.message)
    }

    fn unexpected(&self, expected: MessageKind, got: &Message) -> ProtocolError {
        ProtocolError::UnexpectedMessage {
            round: self.round,
            expected,
            got: got.kind(),
        }
    }

    fn malformed(&self, reason: String) -> ProtocolError {
        ProtocolError::Malformed {
            round: self.round,
            reason,
        }
    }
}
