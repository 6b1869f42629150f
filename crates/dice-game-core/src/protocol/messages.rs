//! Protocol messages.

use crate::crypto::{Blinding, Commitment};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a protocol message, one mailbox slot each
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Commitment,
    DieThrow,
    Opening,
    Acknowledgement,
}

impl MessageKind {
    pub const ALL: [MessageKind; 4] = [
        MessageKind::Commitment,
        MessageKind::DieThrow,
        MessageKind::Opening,
        MessageKind::Acknowledgement,
    ];

    /// Slot index inside a mailbox
    pub fn index(&self) -> usize {
        match self {
            MessageKind::Commitment => 0,
            MessageKind::DieThrow => 1,
            MessageKind::Opening => 2,
            MessageKind::Acknowledgement => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Commitment => "commitment",
            MessageKind::DieThrow => "die_throw",
            MessageKind::Opening => "opening",
            MessageKind::Acknowledgement => "acknowledgement",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The four messages of one round.
///
/// Die values travel as raw integers; range checks are the receiver's job
/// since an out-of-range value is a protocol fault, not a parse error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// Committer -> Verifier
    Commitment { c: Commitment },
    /// Verifier -> Committer
    DieThrow { value: u64 },
    /// Committer -> Verifier
    Opening { value: u64, blinding: Blinding },
    /// Verifier -> Committer
    Acknowledgement { valid: bool },
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Commitment { .. } => MessageKind::Commitment,
            Message::DieThrow { .. } => MessageKind::DieThrow,
            Message::Opening { .. } => MessageKind::Opening,
            Message::Acknowledgement { .. } => MessageKind::Acknowledgement,
        }
    }
}

/// A message tagged with the round it belongs to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub round: u32,
    pub message: Message,
}

impl Envelope {
    pub fn new(round: u32, message: Message) -> Self {
        Self { round, message }
    }

    pub fn kind(&self) -> MessageKind {
        self.message.kind()
    }
}
