//! Group parameters for the Pedersen commitment.

use super::CryptoError;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

/// Demonstration modulus. Far too small to be binding against a determined
/// opponent; production deployments must supply a prime of hundreds of bits.
const DEMO_P: u64 = 6661;
const DEMO_G: u64 = 666;
const DEMO_H: u64 = 426;

/// Fixed witnesses for Miller-Rabin; deterministic below 3.3 * 10^24.
const MILLER_RABIN_BASES: [u32; 13] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41];

/// Public parameters `(p, g, h)`: a prime modulus and two bases in `Z_p^*`.
///
/// Deserialized parameters go through [`GroupParams::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedParams")]
pub struct GroupParams {
    #[serde(with = "super::biguint_hex")]
    p: BigUint,
    #[serde(with = "super::biguint_hex")]
    g: BigUint,
    #[serde(with = "super::biguint_hex")]
    h: BigUint,
}

/// Wire form of [`GroupParams`] before validation
#[derive(Deserialize)]
struct UncheckedParams {
    #[serde(with = "super::biguint_hex")]
    p: BigUint,
    #[serde(with = "super::biguint_hex")]
    g: BigUint,
    #[serde(with = "super::biguint_hex")]
    h: BigUint,
}

impl TryFrom<UncheckedParams> for GroupParams {
    type Error = CryptoError;

    fn try_from(raw: UncheckedParams) -> Result<Self, Self::Error> {
        GroupParams::new(raw.p, raw.g, raw.h)
    }
}

impl GroupParams {
    /// Create validated parameters
    pub fn new(p: BigUint, g: BigUint, h: BigUint) -> Result<Self, CryptoError> {
        let params = Self { p, g, h };
        params.validate()?;
        Ok(params)
    }

    /// The demonstration parameters `p = 6661, g = 666, h = 426`
    pub fn demo() -> Self {
        Self {
            p: BigUint::from(DEMO_P),
            g: BigUint::from(DEMO_G),
            h: BigUint::from(DEMO_H),
        }
    }

    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn g(&self) -> &BigUint {
        &self.g
    }

    pub fn h(&self) -> &BigUint {
        &self.h
    }

    /// Order of `Z_p^*`, i.e. `p - 1`. Blindings are sampled below this.
    pub fn group_order(&self) -> BigUint {
        &self.p - 1u32
    }

    /// Check the parameters describe a usable commitment group.
    ///
    /// Rejects a composite modulus, bases outside `(1, p)`, identical bases,
    /// and bases of order 1 or 2. Whether `g` and `h` generate a subgroup of
    /// cryptographic size is a deployment concern and is not checked here.
    pub fn validate(&self) -> Result<(), CryptoError> {
        let one = BigUint::one();
        if self.p <= BigUint::from(3u32) {
            return Err(CryptoError::InvalidParams(format!(
                "modulus {} is too small",
                self.p
            )));
        }
        if !is_probable_prime(&self.p) {
            return Err(CryptoError::InvalidParams(format!(
                "modulus {} is not prime",
                self.p
            )));
        }
        for (name, base) in [("g", &self.g), ("h", &self.h)] {
            if *base <= one || *base >= self.p {
                return Err(CryptoError::InvalidParams(format!(
                    "{name} must lie strictly between 1 and p"
                )));
            }
            if base.modpow(&BigUint::from(2u32), &self.p) == one {
                return Err(CryptoError::InvalidParams(format!(
                    "{name} has order 2"
                )));
            }
        }
        if self.g == self.h {
            return Err(CryptoError::InvalidParams(
                "g and h must be distinct".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GroupParams {
    fn default() -> Self {
        Self::demo()
    }
}

/// Miller-Rabin over a fixed witness set.
fn is_probable_prime(n: &BigUint) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u32);
    if *n < two {
        return false;
    }
    for base in MILLER_RABIN_BASES {
        let base = BigUint::from(base);
        if *n == base {
            return true;
        }
        if (n % &base).is_zero() {
            return false;
        }
    }

    let n_minus_one = n - &one;
    let mut d = n_minus_one.clone();
    let mut s = 0u32;
    while (&d % &two).is_zero() {
        d >>= 1;
        s += 1;
    }

    'witness: for base in MILLER_RABIN_BASES {
        let mut x = BigUint::from(base).modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
