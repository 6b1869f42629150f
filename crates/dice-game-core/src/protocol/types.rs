//! Protocol types.

use crate::dice::DieValue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Role a party plays in one round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Commits to its die first, opens after seeing the peer's throw
    Committer,
    /// Throws in the clear, then checks the committer's opening
    Verifier,
}

impl Role {
    /// The role the other party plays in the same round
    pub fn opponent(&self) -> Role {
        match self {
            Role::Committer => Role::Verifier,
            Role::Verifier => Role::Committer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Committer => write!(f, "Committer"),
            Role::Verifier => write!(f, "Verifier"),
        }
    }
}

/// Result of one round, from the local party's point of view.
///
/// `Win` and `Loss` carry the local party's role in that round, so the
/// committer's `Win(Committer)` is the verifier's `Loss(Verifier)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Win(Role),
    Loss(Role),
    Tie,
    CheatDetected { accuser: Role, accused: Role },
}

impl RoundOutcome {
    /// Judge a round with valid dice on both sides
    pub fn judge(role: Role, own: DieValue, peer: DieValue) -> Self {
        match own.against(&peer) {
            Ordering::Greater => RoundOutcome::Win(role),
            Ordering::Less => RoundOutcome::Loss(role),
            Ordering::Equal => RoundOutcome::Tie,
        }
    }

    /// A failed opening: the verifier accuses the committer
    pub fn cheat() -> Self {
        RoundOutcome::CheatDetected {
            accuser: Role::Verifier,
            accused: Role::Committer,
        }
    }

    pub fn is_cheat(&self) -> bool {
        matches!(self, RoundOutcome::CheatDetected { .. })
    }
}

impl fmt::Display for RoundOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundOutcome::Win(role) => write!(f, "win as {}", role),
            RoundOutcome::Loss(role) => write!(f, "loss as {}", role),
            RoundOutcome::Tie => write!(f, "tie"),
            RoundOutcome::CheatDetected { accuser, accused } => {
                write!(f, "{} caught {} cheating", accuser, accused)
            }
        }
    }
}

/// Everything the local party learned in one round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Round number, starting at 1
    pub round: u32,
    /// Local role in this round
    pub role: Role,
    /// Local die
    pub own: DieValue,
    /// Peer's die; `None` when the peer's opening was rejected
    pub peer: Option<DieValue>,
    pub outcome: RoundOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn die(value: u64) -> DieValue {
        DieValue::new(value).unwrap()
    }

    #[test]
    fn test_role_opponent() {
        assert_eq!(Role::Committer.opponent(), Role::Verifier);
        assert_eq!(Role::Verifier.opponent(), Role::Committer);
    }

    #[test]
    fn test_judge_committer_perspective() {
        assert_eq!(
            RoundOutcome::judge(Role::Committer, die(4), die(2)),
            RoundOutcome::Win(Role::Committer)
        );
        assert_eq!(
            RoundOutcome::judge(Role::Committer, die(3), die(3)),
            RoundOutcome::Tie
        );
        assert_eq!(
            RoundOutcome::judge(Role::Committer, die(2), die(5)),
            RoundOutcome::Loss(Role::Committer)
        );
    }

    #[test]
    fn test_judge_is_symmetric() {
        for a in DieValue::all() {
            for b in DieValue::all() {
                let committer = RoundOutcome::judge(Role::Committer, a, b);
                let verifier = RoundOutcome::judge(Role::Verifier, b, a);
                let mirrored = match committer {
                    RoundOutcome::Win(_) => RoundOutcome::Loss(Role::Verifier),
                    RoundOutcome::Loss(_) => RoundOutcome::Win(Role::Verifier),
                    other => other,
                };
                assert_eq!(verifier, mirrored);
            }
        }
    }

    #[test]
    fn test_cheat_outcome() {
        let outcome = RoundOutcome::cheat();
        assert!(outcome.is_cheat());
        assert!(!RoundOutcome::Tie.is_cheat());
        assert_eq!(outcome.to_string(), "Verifier caught Committer cheating");
    }
}
