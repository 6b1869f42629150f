//! Multi-round game session.
//!
//! A session plays a fixed number of rounds against one peer, swapping
//! Committer and Verifier every round, and stops at the first round in which
//! a cheat is detected.

use crate::crypto::{Blinding, CommitmentScheme, CryptoError};
use crate::dice::DieValue;
use crate::protocol::{ProtocolError, Role, RoundOutcome, RoundProtocol, RoundRecord};
use crate::transport::Transport;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// How often a repeated blinding is redrawn before the source is declared broken
const MAX_BLINDING_ATTEMPTS: usize = 8;

/// Unique session identifier, local to this process
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session configuration
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Player name, for logs
    pub name: String,
    /// Number of rounds to play
    pub rounds: u32,
    /// Local role in the first round
    pub first_mover: Role,
    /// Upper bound on every wait for a peer message
    pub timeout: Duration,
}

impl SessionConfig {
    pub fn new(rounds: u32, first_mover: Role) -> Self {
        Self {
            rounds,
            first_mover,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "player".to_string(),
            rounds: 3,
            first_mover: Role::Committer,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Errors that end a session without a verdict
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Round {round}: random source failed: {source}")]
    RandomSource {
        round: u32,
        #[source]
        source: CryptoError,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Session already finished")]
    Finished,
}

impl SessionError {
    /// Round in which the error occurred, if any
    pub fn round(&self) -> Option<u32> {
        match self {
            SessionError::RandomSource { round, .. } => Some(*round),
            SessionError::Protocol(e) => Some(e.round()),
            SessionError::Finished => None,
        }
    }
}

/// Wins, losses and ties of the local player
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl Tally {
    pub fn from_records(records: &[RoundRecord]) -> Self {
        records.iter().fold(Self::default(), |mut tally, record| {
            match record.outcome {
                RoundOutcome::Win(_) => tally.wins += 1,
                RoundOutcome::Loss(_) => tally.losses += 1,
                RoundOutcome::Tie => tally.ties += 1,
                RoundOutcome::CheatDetected { .. } => {}
            }
            tally
        })
    }
}

/// How a session ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionResult {
    /// Every round was played
    Completed(Vec<RoundRecord>),
    /// A cheat was detected; `outcomes` ends with the offending round
    Aborted {
        outcomes: Vec<RoundRecord>,
        round: u32,
        accuser: Role,
        accused: Role,
    },
}

impl SessionResult {
    pub fn outcomes(&self) -> &[RoundRecord] {
        match self {
            SessionResult::Completed(outcomes) => outcomes,
            SessionResult::Aborted { outcomes, .. } => outcomes,
        }
    }

    pub fn tally(&self) -> Tally {
        Tally::from_records(self.outcomes())
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, SessionResult::Aborted { .. })
    }
}

/// Lifecycle phase, published through [`SessionStatus`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Playing,
    Completed,
    Aborted,
    Failed,
}

/// Snapshot of a session, refreshed after every round
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub name: String,
    pub phase: SessionPhase,
    pub rounds: u32,
    /// Local role in the next round to be played
    pub next_role: Role,
    pub tally: Tally,
    pub records: Vec<RoundRecord>,
}

/// One game between the local player and a peer
pub struct GameSession<T, R = OsRng> {
    id: SessionId,
    config: SessionConfig,
    transport: T,
    scheme: CommitmentScheme<R>,
    role: Role,
    records: Vec<RoundRecord>,
    used_blindings: HashSet<Blinding>,
    over: bool,
    status: watch::Sender<SessionStatus>,
}

impl<T: Transport> GameSession<T, OsRng> {
    /// Create a session using the demonstration group and OS randomness
    pub fn new(config: SessionConfig, transport: T) -> Self {
        Self::with_scheme(config, transport, CommitmentScheme::default())
    }
}

impl<T: Transport, R: RngCore + CryptoRng + Send> GameSession<T, R> {
    /// Create a session with an explicit commitment scheme and random source
    pub fn with_scheme(config: SessionConfig, transport: T, scheme: CommitmentScheme<R>) -> Self {
        let id = SessionId::new();
        let (status, _) = watch::channel(SessionStatus {
            session_id: id,
            name: config.name.clone(),
            phase: SessionPhase::Playing,
            rounds: config.rounds,
            next_role: config.first_mover,
            tally: Tally::default(),
            records: Vec::new(),
        });
        Self {
            id,
            role: config.first_mover,
            config,
            transport,
            scheme,
            records: Vec::new(),
            used_blindings: HashSet::new(),
            over: false,
            status,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Local role in the next round
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn records(&self) -> &[RoundRecord] {
        &self.records
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Receive a fresh snapshot after every round
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Play the next round, then hand the other role to the next call
    pub async fn play_round(&mut self) -> Result<RoundRecord, SessionError> {
        if self.over || self.records.len() as u32 >= self.config.rounds {
            return Err(SessionError::Finished);
        }

        let round = self.records.len() as u32 + 1;
        let role = self.role;
        let span = info_span!("round", player = %self.config.name, round, role = %role);

        let result = self.play_as(round, role).instrument(span).await;
        self.role = role.opponent();

        match result {
            Ok(record) => {
                if record.outcome.is_cheat() {
                    self.over = true;
                }
                self.records.push(record.clone());
                self.publish(if self.over {
                    SessionPhase::Aborted
                } else if self.records.len() as u32 == self.config.rounds {
                    SessionPhase::Completed
                } else {
                    SessionPhase::Playing
                });
                Ok(record)
            }
            Err(e) => {
                self.over = true;
                self.publish(SessionPhase::Failed);
                Err(e)
            }
        }
    }

    /// Play every round, stopping early if a cheat is detected
    pub async fn run(&mut self) -> Result<SessionResult, SessionError> {
        info!(
            session = %self.id,
            "{} starts a {}-round session as {}",
            self.config.name, self.config.rounds, self.role
        );

        while (self.records.len() as u32) < self.config.rounds {
            let record = self.play_round().await?;
            if let RoundOutcome::CheatDetected { accuser, accused } = record.outcome {
                warn!(
                    "{} ends the session: {} caught {} cheating in round {}",
                    self.config.name, accuser, accused, record.round
                );
                return Ok(SessionResult::Aborted {
                    outcomes: self.records.clone(),
                    round: record.round,
                    accuser,
                    accused,
                });
            }
        }

        let tally = Tally::from_records(&self.records);
        info!(
            "{} finished: {} won, {} lost, {} tied",
            self.config.name, tally.wins, tally.losses, tally.ties
        );
        Ok(SessionResult::Completed(self.records.clone()))
    }

    async fn play_as(&mut self, round: u32, role: Role) -> Result<RoundRecord, SessionError> {
        let own = DieValue::roll(self.scheme.rng_mut())
            .map_err(|source| SessionError::RandomSource { round, source })?;

        match role {
            Role::Committer => {
                info!("{} starts this round", self.config.name);
                let blinding = self.fresh_blinding(round)?;
                let mut protocol = RoundProtocol::new(
                    &self.transport,
                    self.scheme.params(),
                    round,
                    self.config.timeout,
                );
                Ok(protocol.run_committer(own, blinding).await?)
            }
            Role::Verifier => {
                let mut protocol = RoundProtocol::new(
                    &self.transport,
                    self.scheme.params(),
                    round,
                    self.config.timeout,
                );
                Ok(protocol.run_verifier(own).await?)
            }
        }
    }

    /// Sample a blinding never used before in this session
    fn fresh_blinding(&mut self, round: u32) -> Result<Blinding, SessionError> {
        for _ in 0..MAX_BLINDING_ATTEMPTS {
            let blinding = self
                .scheme
                .sample_blinding()
                .map_err(|source| SessionError::RandomSource { round, source })?;
            if self.used_blindings.insert(blinding.clone()) {
                return Ok(blinding);
            }
            warn!("Random source repeated a blinding, drawing again");
        }
        Err(SessionError::RandomSource {
            round,
            source: CryptoError::RepeatedBlinding,
        })
    }

    fn publish(&self, phase: SessionPhase) {
        self.status.send_replace(SessionStatus {
            session_id: self.id,
            name: self.config.name.clone(),
            phase,
            rounds: self.config.rounds,
            next_role: self.role,
            tally: Tally::from_records(&self.records),
            records: self.records.clone(),
        });
    }
}
