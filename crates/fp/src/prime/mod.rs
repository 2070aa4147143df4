//! The field facts: supported primes and the precomputed table of multiplicative inverses.
//!
//! Everything in this module is pure and read-only. The linear algebra never computes an inverse
//! itself; it reads [`inverse`], which is backed by a table generated at compile time.

use std::{fmt, str::FromStr};

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::constants::{INVERSE_TABLE, MAX_PRIME, NOT_A_PRIME, PRIME_TO_INDEX_MAP};

pub const TWO: ValidPrime = ValidPrime::new(2);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimeError {
    #[error("Not an integer: {0}")]
    NotAnInteger(std::num::ParseIntError),
    #[error("{0} is not a valid prime")]
    InvalidPrime(u32),
}

/// A prime `p` whose elements fit in a byte. Every matrix carries its `ValidPrime`, and two
/// matrices can only be combined if their primes agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValidPrime {
    p: u32,
}

pub const fn is_prime(p: u32) -> bool {
    // (2..p).all(|k| p % k != 0), but make it const
    if p < 2 {
        return false;
    }
    let mut k = 2;
    while k < p {
        if p % k == 0 {
            return false;
        }
        k += 1;
    }
    true
}

impl ValidPrime {
    pub const fn new(p: u32) -> Self {
        assert!(
            p as usize <= MAX_PRIME,
            "Tried to construct a prime larger than the largest supported prime"
        );
        assert!(is_prime(p), "Tried to construct a composite dynamic prime");
        Self { p }
    }

    pub const fn new_unchecked(p: u32) -> Self {
        Self { p }
    }

    pub const fn as_u32(self) -> u32 {
        self.p
    }

    pub const fn as_usize(self) -> usize {
        self.p as usize
    }

    /// Computes the sum mod p.
    pub const fn sum(self, n1: u32, n2: u32) -> u32 {
        ((n1 as u64 + n2 as u64) % self.p as u64) as u32
    }

    /// Computes the product mod p. This takes care of overflow.
    pub const fn product(self, n1: u32, n2: u32) -> u32 {
        ((n1 as u64 * n2 as u64) % self.p as u64) as u32
    }

    /// The additive inverse of `k`, for `k` already reduced mod p.
    pub const fn neg(self, k: u32) -> u32 {
        if k == 0 {
            0
        } else {
            self.p - k
        }
    }

    pub fn inverse(self, k: u32) -> u32 {
        inverse(self, k)
    }
}

impl TryFrom<u32> for ValidPrime {
    type Error = PrimeError;

    fn try_from(p: u32) -> Result<Self, PrimeError> {
        if p as usize <= MAX_PRIME && PRIME_TO_INDEX_MAP[p as usize] != NOT_A_PRIME {
            Ok(Self { p })
        } else {
            Err(PrimeError::InvalidPrime(p))
        }
    }
}

impl FromStr for ValidPrime {
    type Err = PrimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let p: u32 = s.parse().map_err(PrimeError::NotAnInteger)?;
        Self::try_from(p)
    }
}

impl fmt::Display for ValidPrime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        <u32 as fmt::Display>::fmt(&self.p, f)
    }
}

impl PartialEq<u32> for ValidPrime {
    fn eq(&self, other: &u32) -> bool {
        self.p == *other
    }
}

impl From<ValidPrime> for u32 {
    fn from(value: ValidPrime) -> u32 {
        value.p
    }
}

impl Serialize for ValidPrime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.p.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValidPrime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let p: u32 = u32::deserialize(deserializer)?;
        Self::try_from(p).map_err(D::Error::custom)
    }
}

#[cfg(feature = "proptest")]
impl proptest::arbitrary::Arbitrary for ValidPrime {
    type Parameters = ();
    type Strategy = proptest::sample::Select<Self>;

    /// An arbitrary supported prime. Small primes are where the interesting cancellations happen,
    /// so every supported prime is equally likely rather than weighting by size.
    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        let primes: Vec<Self> = crate::constants::PRIMES
            .iter()
            .map(|&p| Self::new_unchecked(p))
            .collect();
        proptest::sample::select(primes)
    }
}

/// Compute b^e mod p. This is only used to populate the inverse table at compile time.
pub const fn power_mod(p: u32, mut b: u32, mut e: u32) -> u32 {
    assert!(p > 0);
    let mut result: u32 = 1;
    while e > 0 {
        if (e & 1) == 1 {
            result = ((result as u64) * (b as u64) % (p as u64)) as u32;
        }
        b = (((b as u64) * (b as u64)) % (p as u64)) as u32;
        e >>= 1;
    }
    result
}

/// Uses the lookup table built in `constants`.
pub fn inverse(p: ValidPrime, k: u32) -> u32 {
    assert!(k > 0 && p.as_u32() > k, "{k} has no inverse mod {p}");
    INVERSE_TABLE[PRIME_TO_INDEX_MAP[p.as_usize()]][k as usize] as u32
}

/// The coefficient `-(pivot^{-1})` used to clear a column against a pivot entry.
pub fn elimination_coefficient(p: ValidPrime, pivot: u32) -> u32 {
    p.neg(inverse(p, pivot))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{elimination_coefficient, inverse, is_prime, PrimeError, ValidPrime};
    use crate::constants::{MAX_PRIME, PRIMES};

    #[test]
    fn validprime_test() {
        for p in (0..=MAX_PRIME as u32).filter(|&p| is_prime(p)) {
            assert_eq!(ValidPrime::new(p), p);
        }
        assert_eq!(PRIMES.last(), Some(&251));
    }

    #[test]
    fn validprime_invalid() {
        assert_eq!(
            ValidPrime::try_from(4).unwrap_err(),
            PrimeError::InvalidPrime(4)
        );
        assert_eq!(
            ValidPrime::try_from(257).unwrap_err(),
            PrimeError::InvalidPrime(257)
        );
        assert_eq!(
            "4".parse::<ValidPrime>().unwrap_err(),
            PrimeError::InvalidPrime(4)
        );
        assert_eq!(
            "4.0".parse::<ValidPrime>().unwrap_err(),
            PrimeError::NotAnInteger("4.0".parse::<u32>().unwrap_err())
        );
    }

    #[test]
    fn inverse_test() {
        for &p in PRIMES.iter() {
            let p = ValidPrime::new(p);
            for k in 1..p.as_u32() {
                assert_eq!((inverse(p, k) * k) % p.as_u32(), 1);
            }
        }
    }

    #[test]
    fn elimination_coefficient_clears_pivot() {
        for &p in PRIMES.iter() {
            let p = ValidPrime::new(p);
            for pivot in 1..p.as_u32() {
                let c = elimination_coefficient(p, pivot);
                assert_eq!(p.sum(pivot, p.product(c, pivot) * pivot % p.as_u32()), 0);
            }
        }
    }

    #[test]
    fn validprime_serde() {
        let p: ValidPrime = serde_json::from_str("7").unwrap();
        assert_eq!(p, 7);
        assert_eq!(serde_json::to_string(&p).unwrap(), "7");
        assert!(serde_json::from_str::<ValidPrime>("9").is_err());
    }
}
