//! Arbitrary-precision integers and decimals.

use std::fmt;

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{Signed, ToPrimitive, Zero};

/// An Ion integer.
///
/// Always normalized: [`Int::Big`] only holds values outside the `i64` range,
/// so derived equality is value equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Int {
    I64(i64),
    Big(BigInt),
}

impl Int {
    /// Builds a normalized integer from a `BigInt`.
    pub fn from_big(value: BigInt) -> Int {
        match value.to_i64() {
            Some(v) => Int::I64(v),
            None => Int::Big(value),
        }
    }

    /// Builds an integer from a sign and big-endian magnitude.
    pub fn from_sign_magnitude(negative: bool, magnitude: BigUint) -> Int {
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        Int::from_big(BigInt::from_biguint(sign, magnitude))
    }

    /// Returns the value as `i64` if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Int::I64(v) => Some(*v),
            Int::Big(_) => None,
        }
    }

    /// Returns the value as a `BigInt`.
    pub fn to_big_int(&self) -> BigInt {
        match self {
            Int::I64(v) => BigInt::from(*v),
            Int::Big(v) => v.clone(),
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Int::I64(0))
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Int::I64(v) => *v < 0,
            Int::Big(v) => v.is_negative(),
        }
    }

    /// Returns the absolute value.
    pub fn magnitude(&self) -> BigUint {
        match self {
            Int::I64(v) => BigUint::from(v.unsigned_abs()),
            Int::Big(v) => v.magnitude().clone(),
        }
    }
}

impl From<i64> for Int {
    fn from(value: i64) -> Self {
        Int::I64(value)
    }
}

impl From<i32> for Int {
    fn from(value: i32) -> Self {
        Int::I64(i64::from(value))
    }
}

impl From<u64> for Int {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => Int::I64(v),
            Err(_) => Int::Big(BigInt::from(value)),
        }
    }
}

impl From<BigInt> for Int {
    fn from(value: BigInt) -> Self {
        Int::from_big(value)
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Int::I64(v) => write!(f, "{v}"),
            Int::Big(v) => write!(f, "{v}"),
        }
    }
}

/// Coefficient of a [`Decimal`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Coefficient {
    Finite(BigInt),
    /// Zero with a negative sign, distinct from positive zero on the wire.
    NegativeZero,
}

/// An Ion decimal: `coefficient * 10^exponent`.
///
/// Equality is structural, so `1d0` and `10d-1` differ (as they do on the
/// wire), and negative zero differs from zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    coefficient: Coefficient,
    exponent: i64,
}

impl Decimal {
    pub fn new(coefficient: impl Into<BigInt>, exponent: i64) -> Decimal {
        Decimal {
            coefficient: Coefficient::Finite(coefficient.into()),
            exponent,
        }
    }

    /// `-0` scaled by `10^exponent`.
    pub fn negative_zero(exponent: i64) -> Decimal {
        Decimal {
            coefficient: Coefficient::NegativeZero,
            exponent,
        }
    }

    /// `0d0`.
    pub fn zero() -> Decimal {
        Decimal::new(0, 0)
    }

    pub fn coefficient(&self) -> &Coefficient {
        &self.coefficient
    }

    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// True for both zero and negative zero.
    pub fn is_zero(&self) -> bool {
        match &self.coefficient {
            Coefficient::Finite(c) => c.is_zero(),
            Coefficient::NegativeZero => true,
        }
    }

    pub fn is_negative_zero(&self) -> bool {
        self.coefficient == Coefficient::NegativeZero
    }

    /// True when the sign bit is set (negative values and negative zero).
    pub fn is_sign_negative(&self) -> bool {
        match &self.coefficient {
            Coefficient::Finite(c) => c.is_negative(),
            Coefficient::NegativeZero => true,
        }
    }

    /// Returns the coefficient magnitude.
    pub fn coefficient_magnitude(&self) -> BigUint {
        match &self.coefficient {
            Coefficient::Finite(c) => c.magnitude().clone(),
            Coefficient::NegativeZero => BigUint::zero(),
        }
    }

    /// Converts to a `BigDecimal`; negative zero becomes zero.
    ///
    /// Returns `None` for an exponent of `i64::MIN`, which has no
    /// `BigDecimal` scale.
    pub fn to_big_decimal(&self) -> Option<BigDecimal> {
        let scale = self.exponent.checked_neg()?;
        Some(match &self.coefficient {
            Coefficient::Finite(c) => BigDecimal::new(c.clone(), scale),
            Coefficient::NegativeZero => BigDecimal::new(BigInt::zero(), scale),
        })
    }

    /// Nearest `f64`, preserving the sign of negative zero.
    pub fn to_f64(&self) -> Option<f64> {
        match &self.coefficient {
            Coefficient::NegativeZero => Some(-0.0),
            Coefficient::Finite(_) => self.to_big_decimal()?.to_f64(),
        }
    }
}

impl From<BigDecimal> for Decimal {
    fn from(value: BigDecimal) -> Self {
        let (coefficient, scale) = value.into_bigint_and_exponent();
        Decimal::new(coefficient, -scale)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal::new(value, 0)
    }
}

impl fmt::Display for Decimal {
    /// Ion text notation, e.g. `123d-2` or `-0d0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.coefficient {
            Coefficient::Finite(c) => write!(f, "{c}d{}", self.exponent),
            Coefficient::NegativeZero => write!(f, "-0d{}", self.exponent),
        }
    }
}
