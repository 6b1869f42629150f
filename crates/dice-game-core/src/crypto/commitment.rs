//! Blinding, Commitment and the Pedersen commitment scheme.

use super::{CryptoError, GroupParams};
use crate::dice::DieValue;
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Blinding exponent for a commitment, in `[0, p-2]`
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blinding(#[serde(with = "super::biguint_hex")] BigUint);

impl Blinding {
    /// Create from a raw integer
    pub fn from_biguint(value: BigUint) -> Self {
        Self(value)
    }

    /// Get the underlying integer
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

impl From<u64> for Blinding {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl fmt::Debug for Blinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_bytes_be();
        write!(f, "Blinding({})", hex::encode(&bytes[..bytes.len().min(8)]))
    }
}

impl fmt::Display for Blinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Commitment = g^value * h^blinding mod p
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Commitment(#[serde(with = "super::biguint_hex")] BigUint);

impl Commitment {
    /// Create from a raw integer
    pub fn from_biguint(value: BigUint) -> Self {
        Self(value)
    }

    /// Get the underlying integer
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

impl From<u64> for Commitment {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", hex::encode(self.0.to_bytes_be()))
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl GroupParams {
    /// Compute `(g^value mod p) * (h^blinding mod p) mod p`
    pub fn commit(&self, value: DieValue, blinding: &Blinding) -> Commitment {
        let p = self.p();
        let gm = self.g().modpow(&BigUint::from(value.get()), p);
        let hr = self.h().modpow(blinding.as_biguint(), p);
        Commitment((gm * hr) % p)
    }

    /// Check that `(value, blinding)` opens `commitment`.
    ///
    /// The comparison covers the whole integer; a blinding outside
    /// `[0, p-2]` never opens anything.
    pub fn verify(&self, commitment: &Commitment, value: DieValue, blinding: &Blinding) -> bool {
        if *blinding.as_biguint() >= self.group_order() {
            return false;
        }
        let expected = self.commit(value, blinding);
        let lhs = commitment.0.to_bytes_be();
        let rhs = expected.0.to_bytes_be();
        lhs.len() == rhs.len() && lhs.iter().zip(&rhs).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }
}

/// Pedersen commitment scheme over a random source
pub struct CommitmentScheme<R = OsRng> {
    params: GroupParams,
    rng: R,
}

impl CommitmentScheme<OsRng> {
    /// Create a scheme drawing randomness from the operating system
    pub fn new(params: GroupParams) -> Self {
        Self::with_rng(params, OsRng)
    }
}

impl Default for CommitmentScheme<OsRng> {
    fn default() -> Self {
        Self::new(GroupParams::demo())
    }
}

impl<R: RngCore + CryptoRng> CommitmentScheme<R> {
    /// Create a scheme with an explicit random source
    pub fn with_rng(params: GroupParams, rng: R) -> Self {
        Self { params, rng }
    }

    /// Group parameters used by this scheme
    pub fn params(&self) -> &GroupParams {
        &self.params
    }

    /// Random source, shared with die rolls
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Sample a blinding uniformly from `[0, p-2]` by rejection sampling
    pub fn sample_blinding(&mut self) -> Result<Blinding, CryptoError> {
        let bound = self.params.group_order();
        let bits = bound.bits();
        let len = bits.div_ceil(8) as usize;
        let top_mask = 0xffu8 >> (len as u64 * 8 - bits);
        let mut buf = vec![0u8; len];

        loop {
            self.rng.try_fill_bytes(&mut buf)?;
            buf[0] &= top_mask;
            let candidate = BigUint::from_bytes_be(&buf);
            if candidate < bound {
                return Ok(Blinding(candidate));
            }
        }
    }

    pub fn commit(&self, value: DieValue, blinding: &Blinding) -> Commitment {
        self.params.commit(value, blinding)
    }

    pub fn verify(&self, commitment: &Commitment, value: DieValue, blinding: &Blinding) -> bool {
        self.params.verify(commitment, value, blinding)
    }
}
