//! A 64-bit integer that remembers whether it is signed or unsigned.
//!
//! [`Long`] is the value carried by BSON int64 elements. Every operation returns a new value and
//! wraps modulo 2^64, taking its signedness from the left-hand operand.

use std::{
    cmp::Ordering,
    fmt,
    ops::{Add, BitAnd, BitOr, BitXor, Mul, Neg, Not, Shl, Shr, Sub},
    str::FromStr,
};

use crate::error::{Error, Result};

const TWO_PWR_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_PWR_64: f64 = 18_446_744_073_709_551_616.0;

/// A 64-bit two's complement integer with a signedness flag.
#[derive(Clone, Copy)]
pub struct Long {
    bits: u64,
    unsigned: bool,
}

impl Long {
    /// Signed zero.
    pub const ZERO: Long = Long::from_i64(0);

    /// Unsigned zero.
    pub const UZERO: Long = Long::from_u64(0);

    /// Signed one.
    pub const ONE: Long = Long::from_i64(1);

    /// Unsigned one.
    pub const UONE: Long = Long::from_u64(1);

    /// Signed negative one.
    pub const NEG_ONE: Long = Long::from_i64(-1);

    /// The largest signed value.
    pub const MAX_VALUE: Long = Long::from_i64(i64::MAX);

    /// The smallest signed value.
    pub const MIN_VALUE: Long = Long::from_i64(i64::MIN);

    /// The largest unsigned value.
    pub const MAX_UNSIGNED_VALUE: Long = Long::from_u64(u64::MAX);

    pub const fn from_i64(value: i64) -> Self {
        Self {
            bits: value as u64,
            unsigned: false,
        }
    }

    pub const fn from_u64(value: u64) -> Self {
        Self {
            bits: value,
            unsigned: true,
        }
    }

    pub const fn from_i32(value: i32, unsigned: bool) -> Self {
        Self {
            bits: value as i64 as u64,
            unsigned,
        }
    }

    /// Assembles a value from its low and high 32-bit halves.
    pub const fn from_bits(low: i32, high: i32, unsigned: bool) -> Self {
        Self {
            bits: ((high as u32 as u64) << 32) | (low as u32 as u64),
            unsigned,
        }
    }

    /// Converts a host number, truncating toward zero.
    ///
    /// NaN becomes zero. Values beyond the representable range saturate: to `MIN_VALUE` or
    /// `MAX_VALUE` when signed, and to zero or `MAX_UNSIGNED_VALUE` when unsigned.
    pub fn from_f64(value: f64, unsigned: bool) -> Self {
        if value.is_nan() {
            return if unsigned { Self::UZERO } else { Self::ZERO };
        }
        if unsigned {
            if value < 0.0 {
                return Self::UZERO;
            }
            if value >= TWO_PWR_64 {
                return Self::MAX_UNSIGNED_VALUE;
            }
            return Self::from_u64(value as u64);
        }
        if value <= -TWO_PWR_63 {
            return Self::MIN_VALUE;
        }
        if value + 1.0 >= TWO_PWR_63 {
            return Self::MAX_VALUE;
        }
        Self::from_i64(value as i64)
    }

    /// Parses `text` written in `radix` (2 through 36).
    ///
    /// A single leading `-` negates the result. The literals `NaN`, `Infinity`, `+Infinity` and
    /// `-Infinity` parse as zero. Digits past 64 bits wrap.
    pub fn from_str_radix(text: &str, unsigned: bool, radix: u32) -> Result<Self> {
        if text.is_empty() {
            return Err(Error::number_format("empty string"));
        }
        if matches!(text, "NaN" | "Infinity" | "+Infinity" | "-Infinity") {
            return Ok(Self::ZERO);
        }
        if !(2..=36).contains(&radix) {
            return Err(Error::invalid_argument(format!("radix {radix} is invalid")));
        }

        let (negative, digits) = match text.find('-') {
            Some(0) => (true, &text[1..]),
            Some(_) => return Err(Error::number_format(format!("interior hyphen in {text:?}"))),
            None => (false, text),
        };
        if digits.is_empty() {
            return Err(Error::number_format(format!("no digits in {text:?}")));
        }

        let mut bits: u64 = 0;
        for c in digits.chars() {
            let digit = c.to_digit(radix).ok_or_else(|| {
                Error::number_format(format!("invalid digit {c:?} for radix {radix} in {text:?}"))
            })?;
            bits = bits
                .wrapping_mul(radix as u64)
                .wrapping_add(digit as u64);
        }
        if negative {
            bits = bits.wrapping_neg();
        }
        Ok(Self { bits, unsigned })
    }

    pub const fn is_unsigned(self) -> bool {
        self.unsigned
    }

    /// The low 32 bits as a signed integer.
    pub const fn low_bits(self) -> i32 {
        self.bits as u32 as i32
    }

    /// The high 32 bits as a signed integer.
    pub const fn high_bits(self) -> i32 {
        (self.bits >> 32) as u32 as i32
    }

    pub const fn as_i64(self) -> i64 {
        self.bits as i64
    }

    pub const fn as_u64(self) -> u64 {
        self.bits
    }

    /// The nearest host number; exact only up to 2^53 in magnitude.
    pub fn to_f64(self) -> f64 {
        if self.unsigned {
            self.bits as f64
        } else {
            self.bits as i64 as f64
        }
    }

    pub const fn to_signed(self) -> Self {
        Self {
            bits: self.bits,
            unsigned: false,
        }
    }

    pub const fn to_unsigned(self) -> Self {
        Self {
            bits: self.bits,
            unsigned: true,
        }
    }

    pub const fn is_zero(self) -> bool {
        self.bits == 0
    }

    pub const fn is_negative(self) -> bool {
        !self.unsigned && (self.bits as i64) < 0
    }

    pub const fn is_odd(self) -> bool {
        self.bits & 1 == 1
    }

    /// Value equality. A signed and an unsigned value whose top bits are both set are never
    /// equal, since one is negative and the other exceeds `i64::MAX`.
    pub fn equals(self, other: Long) -> bool {
        if self.unsigned != other.unsigned && self.bits >> 63 == 1 && other.bits >> 63 == 1 {
            return false;
        }
        self.bits == other.bits
    }

    pub fn compare(self, other: Long) -> Ordering {
        if self.equals(other) {
            return Ordering::Equal;
        }
        match (self.is_negative(), other.is_negative()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ if !self.unsigned => {
                if (self.bits.wrapping_sub(other.bits) as i64) < 0 {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            _ => self.bits.cmp(&other.bits),
        }
    }

    pub fn add(self, other: Long) -> Self {
        self.with_bits(self.bits.wrapping_add(other.bits))
    }

    pub fn sub(self, other: Long) -> Self {
        self.with_bits(self.bits.wrapping_sub(other.bits))
    }

    pub fn mul(self, other: Long) -> Self {
        self.with_bits(self.bits.wrapping_mul(other.bits))
    }

    /// Truncating division. `MIN_VALUE / -1` wraps to `MIN_VALUE`.
    pub fn div(self, divisor: Long) -> Result<Self> {
        if divisor.is_zero() {
            return Err(Error::invalid_argument("division by zero"));
        }
        let bits = if self.unsigned {
            self.bits / divisor.bits
        } else {
            (self.bits as i64).wrapping_div(divisor.bits as i64) as u64
        };
        Ok(self.with_bits(bits))
    }

    /// The remainder of [`Long::div`], carrying the sign of the dividend.
    pub fn rem(self, divisor: Long) -> Result<Self> {
        let quotient = self.div(divisor)?;
        Ok(self.sub(quotient.mul(divisor)))
    }

    pub fn negate(self) -> Self {
        self.with_bits(self.bits.wrapping_neg())
    }

    pub fn not(self) -> Self {
        self.with_bits(!self.bits)
    }

    pub fn and(self, other: Long) -> Self {
        self.with_bits(self.bits & other.bits)
    }

    pub fn or(self, other: Long) -> Self {
        self.with_bits(self.bits | other.bits)
    }

    pub fn xor(self, other: Long) -> Self {
        self.with_bits(self.bits ^ other.bits)
    }

    /// Shifts left by `num_bits` modulo 64.
    pub fn shl(self, num_bits: u32) -> Self {
        self.with_bits(self.bits << (num_bits & 63))
    }

    /// Arithmetic right shift by `num_bits` modulo 64, extending the top bit even when unsigned.
    pub fn shr(self, num_bits: u32) -> Self {
        self.with_bits(((self.bits as i64) >> (num_bits & 63)) as u64)
    }

    /// Logical right shift by `num_bits` modulo 64.
    pub fn shru(self, num_bits: u32) -> Self {
        self.with_bits(self.bits >> (num_bits & 63))
    }

    /// Renders the value in `radix` (2 through 36) using lowercase digits.
    pub fn to_string_radix(self, radix: u32) -> Result<String> {
        if !(2..=36).contains(&radix) {
            return Err(Error::invalid_argument(format!("radix {radix} is invalid")));
        }
        let negative = self.is_negative();
        let mut magnitude = if negative {
            (self.bits as i64).unsigned_abs()
        } else {
            self.bits
        };
        if magnitude == 0 {
            return Ok("0".to_string());
        }

        let mut digits = Vec::new();
        while magnitude > 0 {
            let digit = (magnitude % radix as u64) as u32;
            // digit < radix <= 36, so from_digit always succeeds
            digits.push(char::from_digit(digit, radix).unwrap_or('0'));
            magnitude /= radix as u64;
        }
        if negative {
            digits.push('-');
        }
        Ok(digits.into_iter().rev().collect())
    }

    fn with_bits(self, bits: u64) -> Self {
        Self {
            bits,
            unsigned: self.unsigned,
        }
    }
}

impl Default for Long {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialEq for Long {
    fn eq(&self, other: &Self) -> bool {
        self.equals(*other)
    }
}

impl PartialOrd for Long {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(*other))
    }
}

impl fmt::Display for Long {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unsigned {
            fmt::Display::fmt(&self.bits, f)
        } else {
            fmt::Display::fmt(&(self.bits as i64), f)
        }
    }
}

impl fmt::Debug for Long {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unsigned {
            write!(f, "Long({}u)", self.bits)
        } else {
            write!(f, "Long({})", self.bits as i64)
        }
    }
}

impl FromStr for Long {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_str_radix(s, false, 10)
    }
}

impl From<i64> for Long {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl From<i32> for Long {
    fn from(value: i32) -> Self {
        Self::from_i32(value, false)
    }
}

impl From<u64> for Long {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<u32> for Long {
    fn from(value: u32) -> Self {
        Self::from_u64(value as u64)
    }
}

impl From<Long> for i64 {
    fn from(value: Long) -> Self {
        value.as_i64()
    }
}

macro_rules! binary_op {
    ($trait:ident, $method:ident) => {
        impl $trait for Long {
            type Output = Long;

            fn $method(self, rhs: Long) -> Long {
                Long::$method(self, rhs)
            }
        }
    };
}

binary_op!(Add, add);
binary_op!(Sub, sub);
binary_op!(Mul, mul);

impl BitAnd for Long {
    type Output = Long;

    fn bitand(self, rhs: Long) -> Long {
        self.and(rhs)
    }
}

impl BitOr for Long {
    type Output = Long;

    fn bitor(self, rhs: Long) -> Long {
        self.or(rhs)
    }
}

impl BitXor for Long {
    type Output = Long;

    fn bitxor(self, rhs: Long) -> Long {
        Long::xor(self, rhs)
    }
}

impl Shl<u32> for Long {
    type Output = Long;

    fn shl(self, rhs: u32) -> Long {
        Long::shl(self, rhs)
    }
}

impl Shr<u32> for Long {
    type Output = Long;

    fn shr(self, rhs: u32) -> Long {
        Long::shr(self, rhs)
    }
}

impl Neg for Long {
    type Output = Long;

    fn neg(self) -> Long {
        self.negate()
    }
}

impl Not for Long {
    type Output = Long;

    fn not(self) -> Long {
        Long::not(self)
    }
}
