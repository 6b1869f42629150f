//! Dice Duel Core Library
//!
//! This crate provides the commitment scheme, the commit-then-reveal round
//! protocol, the multi-round game session, and the transports that carry
//! protocol messages between the two players.

pub mod crypto;
pub mod dice;
pub mod protocol;
pub mod session;
pub mod transport;

pub use crypto::{Blinding, Commitment, CommitmentScheme, CryptoError, GroupParams};
pub use dice::DieValue;
pub use protocol::{
    Envelope, Message, MessageKind, ProtocolError, Role, RoundOutcome, RoundProtocol, RoundRecord,
    RoundState,
};
pub use session::{
    GameSession, SessionConfig, SessionError, SessionId, SessionPhase, SessionResult,
    SessionStatus, Tally,
};
pub use transport::{HttpTransport, Mailbox, MemoryTransport, Transport, TransportError};
