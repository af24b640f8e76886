//! Arbitrary-precision token amounts.
//!
//! Tally counters, deposits and stake balances can exceed any machine word,
//! so they are carried as `BigUint` and serialized as base-10 strings
//! (`"10000000"`), never as JSON numbers.

use num_bigint::BigUint;
use num_traits::{CheckedSub, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul};
use std::str::FromStr;

use super::decimal::DecimalError;

/// Non-negative big integer with deterministic, truncating arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(BigUint);

impl Amount {
    /// The additive identity.
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// `10^n`, the divisor that undoes a scale of `n` decimal places.
    pub fn pow10(n: usize) -> Self {
        // Scales come from decimal literals and never approach u32::MAX.
        Self(BigUint::from(10u8).pow(n as u32))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Three-way comparison: negative, zero or positive like `big.Int.Cmp`.
    pub fn cmp_sign(&self, other: &Self) -> i8 {
        match self.cmp(other) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    /// Subtraction clamped at zero.
    ///
    /// Only used to retract a previously recorded vote contribution, which
    /// can never exceed the bucket it was added to.
    pub fn saturating_sub(&self, other: &Self) -> Self {
        Self(self.0.checked_sub(&other.0).unwrap_or_default())
    }

    /// Truncating division, `None` for a zero divisor.
    pub fn checked_div(&self, divisor: &Self) -> Option<Self> {
        if divisor.is_zero() {
            None
        } else {
            Some(Self(&self.0 / &divisor.0))
        }
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for Amount {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl FromStr for Amount {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DecimalError::InvalidInteger(s.to_string()));
        }
        BigUint::parse_bytes(s.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| DecimalError::InvalidInteger(s.to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Amount> for &'a Amount {
    type Output = Amount;

    fn add(self, rhs: &'a Amount) -> Amount {
        Amount(&self.0 + &rhs.0)
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, rhs: &Amount) {
        self.0 += &rhs.0;
    }
}

impl<'a> Mul<&'a Amount> for &'a Amount {
    type Output = Amount;

    fn mul(self, rhs: &'a Amount) -> Amount {
        Amount(&self.0 * &rhs.0)
    }
}

impl<'a> Div<&'a Amount> for &'a Amount {
    type Output = Amount;

    /// Truncating division; a zero divisor yields zero.
    fn div(self, rhs: &'a Amount) -> Amount {
        self.checked_div(rhs).unwrap_or_default()
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_str_radix(10))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl de::Visitor<'_> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative base-10 integer string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(Amount::from(v))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}
