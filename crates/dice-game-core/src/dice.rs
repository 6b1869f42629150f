//! Six-sided die values and round judging.

use crate::crypto::CryptoError;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

const FACES: u8 = 6;

/// Largest multiple of six representable in a byte; bytes at or above it
/// are redrawn so every face is equally likely.
const REJECTION_BOUND: u8 = FACES * (u8::MAX / FACES);

/// A die result in `[1, 6]`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct DieValue(u8);

impl DieValue {
    /// Create a die value, rejecting anything outside `[1, 6]`
    pub fn new(value: u64) -> Result<Self, CryptoError> {
        match value {
            1..=6 => Ok(Self(value as u8)),
            _ => Err(CryptoError::DieOutOfRange(value)),
        }
    }

    /// Roll a fair die
    pub fn roll<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Result<Self, CryptoError> {
        let mut byte = [0u8; 1];
        loop {
            rng.try_fill_bytes(&mut byte)?;
            if byte[0] < REJECTION_BOUND {
                return Ok(Self(byte[0] % FACES + 1));
            }
        }
    }

    /// All six faces in ascending order
    pub fn all() -> impl Iterator<Item = DieValue> {
        (1..=FACES).map(DieValue)
    }

    pub fn get(&self) -> u64 {
        u64::from(self.0)
    }

    /// Compare against the opponent's die: strictly higher wins, equal ties
    pub fn against(&self, other: &DieValue) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl TryFrom<u64> for DieValue {
    type Error = CryptoError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DieValue> for u64 {
    fn from(value: DieValue) -> Self {
        value.get()
    }
}

impl fmt::Display for DieValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
