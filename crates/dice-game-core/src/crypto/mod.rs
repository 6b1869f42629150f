//! Cryptographic primitives for the Dice Duel protocol.
//!
//! This module provides:
//! - GroupParams for the prime-order group the commitments live in
//! - Blinding, Commitment and CommitmentScheme for Pedersen commit-reveal

mod commitment;
mod params;

pub use commitment::{Blinding, Commitment, CommitmentScheme};
pub use params::GroupParams;

use thiserror::Error;

/// Errors from randomness and group parameter handling
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Random source failed: {0}")]
    RandomSource(#[from] rand::Error),

    #[error("Random source keeps repeating a blinding value already used in this session")]
    RepeatedBlinding,

    #[error("Invalid group parameters: {0}")]
    InvalidParams(String),

    #[error("Die value out of range: {0}")]
    DieOutOfRange(u64),
}

/// Serde helper encoding big integers as lowercase hex strings
pub(crate) mod biguint_hex {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, s: S) -> Result<S::Ok, S::Error> {
        value.to_str_radix(16).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
        let hex_str = String::deserialize(d)?;
        if hex_str.is_empty() {
            return Err(serde::de::Error::custom("expected a hex integer"));
        }
        BigUint::parse_bytes(hex_str.as_bytes(), 16)
            .ok_or_else(|| serde::de::Error::custom("invalid hex integer"))
    }
}
