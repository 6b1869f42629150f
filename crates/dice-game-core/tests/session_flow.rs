//! Integration tests for complete game sessions.
//!
//! These tests play whole sessions over the in-memory transport, with honest
//! peers and with peers driven by hand to misbehave.

use async_trait::async_trait;
use dice_game_core::{
    Blinding, DieValue, Envelope, GameSession, GroupParams, MemoryTransport, Message, MessageKind,
    ProtocolError, Role, RoundOutcome, SessionConfig, SessionError, SessionResult, Transport,
    TransportError,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport wrapper recording every envelope it sends
struct RecordingTransport {
    inner: MemoryTransport,
    sent: Arc<Mutex<Vec<Envelope>>>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, envelope: Envelope) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(envelope.clone());
        self.inner.send(envelope).await
    }

    async fn recv(&self, kind: MessageKind) -> Result<Envelope, TransportError> {
        self.inner.recv(kind).await
    }
}

/// Transport whose peer accepts a connection but never answers
struct Unresponsive;

#[async_trait]
impl Transport for Unresponsive {
    async fn send(&self, _envelope: Envelope) -> Result<(), TransportError> {
        std::future::pending().await
    }

    async fn recv(&self, _kind: MessageKind) -> Result<Envelope, TransportError> {
        std::future::pending().await
    }
}

fn die(value: u64) -> DieValue {
    DieValue::new(value).unwrap()
}

#[tokio::test]
async fn test_full_session_completes() {
    let (a, b) = MemoryTransport::pair();
    let mut alice = GameSession::new(SessionConfig::new(3, Role::Committer).with_name("Alice"), a);
    let mut bob = GameSession::new(SessionConfig::new(3, Role::Verifier).with_name("Bob"), b);

    let (ra, rb) = tokio::join!(alice.run(), bob.run());
    let (ra, rb) = (ra.unwrap(), rb.unwrap());

    assert!(matches!(ra, SessionResult::Completed(ref o) if o.len() == 3));
    assert!(matches!(rb, SessionResult::Completed(ref o) if o.len() == 3));

    let (ta, tb) = (ra.tally(), rb.tally());
    assert_eq!(ta.wins + ta.losses + ta.ties, 3);
    assert_eq!(ta.wins, tb.losses);
    assert_eq!(ta.losses, tb.wins);
}

#[tokio::test]
async fn test_cheating_committer_is_caught() {
    let (cheater, honest) = MemoryTransport::pair();
    let params = GroupParams::demo();
    let mut session = GameSession::new(SessionConfig::new(3, Role::Verifier), honest);

    let cheat = async {
        // Commit to a two...
        let blinding = Blinding::from(2024);
        let c = params.commit(die(2), &blinding);
        cheater
            .send(Envelope::new(1, Message::Commitment { c }))
            .await
            .unwrap();
        cheater.recv(MessageKind::DieThrow).await.unwrap();

        // ...then claim a five
        cheater
            .send(Envelope::new(1, Message::Opening { value: 5, blinding }))
            .await
            .unwrap();
        cheater.recv(MessageKind::Acknowledgement).await.unwrap()
    };

    let (result, ack) = tokio::join!(session.run(), cheat);
    assert_eq!(ack.message, Message::Acknowledgement { valid: false });

    match result.unwrap() {
        SessionResult::Aborted {
            outcomes,
            round,
            accuser,
            accused,
        } => {
            assert_eq!(round, 1);
            assert_eq!(accuser, Role::Verifier);
            assert_eq!(accused, Role::Committer);
            assert_eq!(outcomes.len(), 1);
            assert_eq!(outcomes[0].peer, None);
            assert!(outcomes[0].outcome.is_cheat());
        }
        other => panic!("expected abort, got {other:?}"),
    }

    // No further rounds are played after the abort
    assert!(matches!(session.play_round().await, Err(SessionError::Finished)));
}

#[tokio::test]
async fn test_cheat_in_later_round_keeps_earlier_outcomes() {
    let (cheater, honest) = MemoryTransport::pair();
    let params = GroupParams::demo();
    let mut session = GameSession::new(SessionConfig::new(3, Role::Committer), honest);

    let cheat = async {
        // Round 1: honest verifier
        let commitment = cheater.recv(MessageKind::Commitment).await.unwrap();
        cheater
            .send(Envelope::new(1, Message::DieThrow { value: 3 }))
            .await
            .unwrap();
        let opening = cheater.recv(MessageKind::Opening).await.unwrap();
        let valid = match (commitment.message, opening.message) {
            (Message::Commitment { c }, Message::Opening { value, blinding }) => {
                params.verify(&c, die(value), &blinding)
            }
            _ => false,
        };
        assert!(valid);
        cheater
            .send(Envelope::new(1, Message::Acknowledgement { valid }))
            .await
            .unwrap();

        // Round 2: open to a different value than committed
        let blinding = Blinding::from(77);
        let c = params.commit(die(1), &blinding);
        cheater
            .send(Envelope::new(2, Message::Commitment { c }))
            .await
            .unwrap();
        cheater.recv(MessageKind::DieThrow).await.unwrap();
        cheater
            .send(Envelope::new(2, Message::Opening { value: 6, blinding }))
            .await
            .unwrap();
    };

    let (result, _) = tokio::join!(session.run(), cheat);
    let result = result.unwrap();

    assert!(result.is_aborted());
    assert_eq!(result.outcomes().len(), 2);
    assert!(!result.outcomes()[0].outcome.is_cheat());
    assert_eq!(result.outcomes()[0].peer, Some(die(3)));
    assert_eq!(
        result.outcomes()[1].outcome,
        RoundOutcome::CheatDetected {
            accuser: Role::Verifier,
            accused: Role::Committer
        }
    );
}

#[tokio::test]
async fn test_rejected_opening_aborts_committer() {
    let (liar, honest) = MemoryTransport::pair();
    let mut session = GameSession::new(SessionConfig::new(3, Role::Committer), honest);

    let lie = async {
        liar.recv(MessageKind::Commitment).await.unwrap();
        liar.send(Envelope::new(1, Message::DieThrow { value: 1 }))
            .await
            .unwrap();
        liar.recv(MessageKind::Opening).await.unwrap();
        liar.send(Envelope::new(1, Message::Acknowledgement { valid: false }))
            .await
            .unwrap();
    };

    let (result, _) = tokio::join!(session.run(), lie);
    match result.unwrap() {
        SessionResult::Aborted { accused, round, .. } => {
            assert_eq!(accused, Role::Committer);
            assert_eq!(round, 1);
        }
        other => panic!("expected abort, got {other:?}"),
    }
}

#[tokio::test]
async fn test_no_blinding_reused_across_rounds() {
    let (a, b) = MemoryTransport::pair();
    let sent = Arc::new(Mutex::new(Vec::new()));
    let recording = RecordingTransport {
        inner: a,
        sent: sent.clone(),
    };

    let mut alice = GameSession::new(SessionConfig::new(40, Role::Committer), recording);
    let mut bob = GameSession::new(SessionConfig::new(40, Role::Verifier), b);
    let (ra, rb) = tokio::join!(alice.run(), bob.run());
    ra.unwrap();
    rb.unwrap();

    let sent = sent.lock().unwrap();
    let blindings: Vec<&Blinding> = sent
        .iter()
        .filter_map(|e| match &e.message {
            Message::Opening { blinding, .. } => Some(blinding),
            _ => None,
        })
        .collect();
    assert_eq!(blindings.len(), 20);
    let distinct: HashSet<&Blinding> = blindings.iter().copied().collect();
    assert_eq!(distinct.len(), blindings.len());

    // Envelopes go out in round order
    let rounds: Vec<u32> = sent.iter().map(|e| e.round).collect();
    assert!(rounds.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_silent_peer_times_out() {
    let (_silent, honest) = MemoryTransport::pair();
    let config = SessionConfig::new(3, Role::Committer).with_timeout(Duration::from_secs(10));
    let mut session = GameSession::new(config, honest);

    let err = session.run().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Protocol(ProtocolError::Timeout {
            round: 1,
            kind: MessageKind::DieThrow
        })
    ));
    assert_eq!(err.round(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_peer_times_out_on_send() {
    let config = SessionConfig::new(3, Role::Committer).with_timeout(Duration::from_secs(10));
    let mut session = GameSession::new(config, Unresponsive);

    let err = tokio::time::timeout(Duration::from_secs(3600), session.run())
        .await
        .expect("session hung on a send")
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Protocol(ProtocolError::SendTimeout {
            round: 1,
            kind: MessageKind::Commitment
        })
    ));
}

#[tokio::test]
async fn test_peer_gone_is_transport_error() {
    let (gone, honest) = MemoryTransport::pair();
    gone.close();
    let mut session = GameSession::new(SessionConfig::new(3, Role::Committer), honest);

    let err = session.run().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Protocol(ProtocolError::Transport {
            round: 1,
            source: TransportError::Closed
        })
    ));
}
