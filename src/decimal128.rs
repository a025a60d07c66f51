//! [BSON Decimal128](https://github.com/mongodb/specifications/blob/master/source/bson-decimal128/decimal128.md) data type representation

use std::{fmt, str::FromStr};

use crate::error::{Decimal128ErrorKind, Error, Result};

const EXPONENT_MAX: i64 = 6111;
const EXPONENT_MIN: i64 = -6176;
const EXPONENT_BIAS: i64 = 6176;
const MAX_DIGITS: usize = 34;

const COMBINATION_MASK: u32 = 0x1f;
const EXPONENT_MASK: u32 = 0x3fff;
const COMBINATION_INFINITY: u32 = 30;
const COMBINATION_NAN: u32 = 31;

const SIGN_BIT: u64 = 1 << 63;

/// Struct representing a BSON Decimal128 type.
///
/// The value is stored as its raw IEEE 754-2008 decimal128 encoding (BID, little-endian) and is
/// converted to and from text without going through binary floating point, so
/// `"1.0".parse::<Decimal128>()?.to_string()` is `"1.0"`, trailing zero included.
#[derive(Copy, Clone, Hash, PartialEq, Eq)]
pub struct Decimal128 {
    /// BSON bytes containing the decimal128. Stored for round tripping.
    pub(crate) bytes: [u8; 16],
}

impl Decimal128 {
    /// The canonical NaN encoding.
    pub const NAN: Decimal128 = Decimal128::with_high_byte(0x7c);

    /// Positive infinity.
    pub const INFINITY: Decimal128 = Decimal128::with_high_byte(0x78);

    /// Negative infinity.
    pub const NEG_INFINITY: Decimal128 = Decimal128::with_high_byte(0xf8);

    const fn with_high_byte(byte: u8) -> Self {
        let mut bytes = [0u8; 16];
        bytes[15] = byte;
        Self { bytes }
    }

    fn infinity(negative: bool) -> Self {
        if negative {
            Self::NEG_INFINITY
        } else {
            Self::INFINITY
        }
    }

    /// Constructs a new `Decimal128` from the provided raw byte representation.
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self { bytes }
    }

    /// Constructs a new `Decimal128` from a slice that must hold exactly 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 16] = bytes.try_into().map_err(|_| {
            Error::decimal128(Decimal128ErrorKind::InvalidLength {
                length: bytes.len(),
            })
        })?;
        Ok(Self { bytes })
    }

    /// Returns the raw byte representation of this `Decimal128`.
    pub fn bytes(&self) -> [u8; 16] {
        self.bytes
    }

    pub fn is_nan(&self) -> bool {
        self.combination() == COMBINATION_NAN
    }

    pub fn is_infinite(&self) -> bool {
        self.combination() == COMBINATION_INFINITY
    }

    fn high_word(&self) -> u32 {
        u32::from_le_bytes([self.bytes[12], self.bytes[13], self.bytes[14], self.bytes[15]])
    }

    fn combination(&self) -> u32 {
        (self.high_word() >> 26) & COMBINATION_MASK
    }

    /// Parses decimal text such as `"-1.05E+3"`, `"0.001"`, `"Infinity"` or `"NaN"`.
    ///
    /// Text that is shaped like a number but cannot be represented exactly is not an error: an
    /// exponent with no digits produces NaN, values that overflow produce an infinity, and more
    /// than 34 significant digits are rounded half to even. Text that is not numeric at all,
    /// including a second radix point or trailing characters, is rejected.
    pub fn parse_str(text: impl AsRef<str>) -> Result<Self> {
        let text = text.as_ref().trim();
        let input = text.as_bytes();

        let shape = scan_decimal_shape(input);
        if input.is_empty()
            || (shape.is_none() && !is_infinity_literal(input) && !is_nan_literal(input))
        {
            return Err(Error::decimal128_unparseable(text));
        }
        if let Some(shape) = shape {
            if shape.exponent_marker && !shape.mantissa {
                return Err(Error::decimal128_unparseable(text));
            }
        }

        let is_negative = input.first() == Some(&b'-');
        // positions below are relative to the unsigned text
        let input = strip_sign(input);
        let at = |i: usize| input.get(i).copied();
        let mut index = 0;

        match at(index) {
            Some(b'i' | b'I') => return Ok(Self::infinity(is_negative)),
            Some(b'N') => return Ok(Self::NAN),
            _ => {}
        }

        let mut saw_radix = false;
        let mut found_non_zero = false;
        // digits read, leading zeros included
        let mut n_digits_read = 0usize;
        // digits from the first non-zero one onward
        let mut n_digits = 0usize;
        let mut n_digits_stored = 0usize;
        let mut radix_position = 0i64;
        let mut first_non_zero = 0usize;
        let mut digits = [0u8; MAX_DIGITS + 2];

        while let Some(c) = at(index) {
            if c == b'.' {
                saw_radix = true;
                index += 1;
                continue;
            }
            if !c.is_ascii_digit() {
                break;
            }

            if n_digits_stored < MAX_DIGITS && (c != b'0' || found_non_zero) {
                if !found_non_zero {
                    first_non_zero = n_digits_read;
                }
                found_non_zero = true;
                digits[n_digits_stored] = c - b'0';
                n_digits_stored += 1;
            }
            if found_non_zero {
                n_digits += 1;
            }
            if saw_radix {
                radix_position += 1;
            }
            n_digits_read += 1;
            index += 1;
        }

        if saw_radix && n_digits_read == 0 {
            return Err(Error::decimal128_unparseable(text));
        }

        let mut exponent = 0i64;
        if let Some(b'e' | b'E') = at(index) {
            let rest = &input[index + 1..];
            let (negative_exponent, exponent_digits) = match rest.first() {
                Some(b'-') => (true, &rest[1..]),
                Some(b'+') => (false, &rest[1..]),
                _ => (false, rest),
            };
            if exponent_digits.is_empty() || !exponent_digits.iter().all(u8::is_ascii_digit) {
                return Ok(Self::NAN);
            }
            let magnitude = exponent_digits.iter().fold(0i64, |acc, d| {
                acc.saturating_mul(10).saturating_add((d - b'0') as i64)
            });
            exponent = if negative_exponent { -magnitude } else { magnitude };
            index = input.len();
        }

        if index < input.len() {
            return Ok(Self::NAN);
        }

        let first_digit = 0usize;
        let mut last_digit;
        let mut significant_digits;

        if n_digits_stored == 0 {
            last_digit = 0;
            digits[0] = 0;
            n_digits = 1;
            n_digits_stored = 1;
            significant_digits = 0;
        } else {
            last_digit = n_digits_stored - 1;
            significant_digits = n_digits;
            if exponent != 0 && significant_digits != 1 {
                while significant_digits > 0
                    && at(first_non_zero + significant_digits - 1) == Some(b'0')
                {
                    significant_digits -= 1;
                }
            }
        }

        if exponent <= radix_position && radix_position.saturating_sub(exponent) > (1 << 14) {
            exponent = EXPONENT_MIN;
        } else {
            exponent = exponent.saturating_sub(radix_position);
        }

        let all_zero = |digits: &[u8]| digits.iter().all(|&d| d == 0);

        // Move the exponent into range by padding the significand with zeros.
        while exponent > EXPONENT_MAX {
            last_digit += 1;
            if last_digit - first_digit > MAX_DIGITS {
                if all_zero(&digits) {
                    exponent = EXPONENT_MAX;
                    break;
                }
                return Ok(Self::infinity(is_negative));
            }
            exponent -= 1;
        }

        // Drop digits that were not stored, or that sit below the smallest exponent.
        while exponent < EXPONENT_MIN || n_digits_stored < n_digits {
            if last_digit == 0 {
                exponent = EXPONENT_MIN;
                significant_digits = 0;
                break;
            }

            if n_digits_stored < n_digits {
                n_digits -= 1;
            } else {
                last_digit -= 1;
            }

            if exponent < EXPONENT_MAX {
                exponent += 1;
            } else {
                if all_zero(&digits) {
                    exponent = EXPONENT_MAX;
                    break;
                }
                return Ok(Self::infinity(is_negative));
            }
        }

        // Round half to even on the first dropped digit.
        if last_digit - first_digit + 1 < significant_digits && at(significant_digits) != Some(b'0')
        {
            let mut end_of_string = n_digits_read;

            // the radix point shifts every input position by one
            if saw_radix && exponent == EXPONENT_MIN {
                first_non_zero += 1;
                end_of_string += 1;
            }

            let digit_at = |i: usize| at(i).filter(u8::is_ascii_digit).map(|c| c - b'0');
            let round_position = first_non_zero + last_digit + 1;

            let mut round_up = false;
            if let Some(round_digit) = digit_at(round_position) {
                if round_digit >= 5 {
                    round_up = true;
                    if round_digit == 5 {
                        round_up = digits[last_digit] % 2 == 1;
                        for i in round_position + 1..end_of_string {
                            if digit_at(i).is_some_and(|d| d != 0) {
                                round_up = true;
                                break;
                            }
                        }
                    }
                }
            }

            if round_up {
                for d_idx in (0..=last_digit).rev() {
                    digits[d_idx] += 1;
                    if digits[d_idx] <= 9 {
                        break;
                    }
                    digits[d_idx] = 0;

                    if d_idx == 0 {
                        if exponent < EXPONENT_MAX {
                            exponent += 1;
                            digits[0] = 1;
                        } else {
                            return Ok(Self::infinity(is_negative));
                        }
                    }
                }
            }
        }

        // Pack the significand as two 17-digit halves.
        let fold = |digits: &[u8]| digits.iter().fold(0u64, |acc, &d| acc * 10 + d as u64);
        let (significand_high, significand_low) = if significant_digits == 0 {
            (0, 0)
        } else if last_digit - first_digit < 17 {
            (0, fold(&digits[first_digit..=last_digit]))
        } else {
            (
                fold(&digits[first_digit..=last_digit - 17]),
                fold(&digits[last_digit - 16..=last_digit]),
            )
        };

        let significand =
            multiply_64x2(significand_high, 100_000_000_000_000_000) + significand_low as u128;
        let significand_high = (significand >> 64) as u64;
        let significand_low = significand as u64;

        let biased_exponent = (exponent + EXPONENT_BIAS) as u64 & EXPONENT_MASK as u64;
        let mut high = if (significand_high >> 49) & 1 == 1 {
            (0x3 << 61) | (biased_exponent << 47) | (significand_high & 0x7fff_ffff_ffff)
        } else {
            (biased_exponent << 49) | (significand_high & 0x1_ffff_ffff_ffff)
        };
        if is_negative {
            high |= SIGN_BIT;
        }

        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&significand_low.to_le_bytes());
        bytes[8..].copy_from_slice(&high.to_le_bytes());
        Ok(Self { bytes })
    }

    fn format(&self) -> String {
        let word = |i: usize| {
            u32::from_le_bytes([
                self.bytes[i],
                self.bytes[i + 1],
                self.bytes[i + 2],
                self.bytes[i + 3],
            ])
        };
        let low = word(0);
        let mid_low = word(4);
        let mid_high = word(8);
        let high = word(12);

        let mut out = String::new();
        if high >> 31 == 1 {
            out.push('-');
        }

        let combination = (high >> 26) & COMBINATION_MASK;
        let (biased_exponent, significand_msb) = if combination >> 3 == 3 {
            match combination {
                COMBINATION_INFINITY => {
                    out.push_str("Infinity");
                    return out;
                }
                COMBINATION_NAN => return "NaN".to_string(),
                _ => ((high >> 15) & EXPONENT_MASK, 0x08 + ((high >> 14) & 0x01)),
            }
        } else {
            ((high >> 17) & EXPONENT_MASK, (high >> 14) & 0x07)
        };
        let exponent = biased_exponent as i64 - EXPONENT_BIAS;

        let top = (high & 0x3fff) + ((significand_msb & 0xf) << 14);
        let mut significand = ((top as u128) << 96)
            | ((mid_high as u128) << 64)
            | ((mid_low as u128) << 32)
            | low as u128;

        // at most 114 bits, which always fits in 36 decimal digits
        let mut digits = [0u8; 36];
        for slot in digits.iter_mut().rev() {
            *slot = (significand % 10) as u8;
            significand /= 10;
        }

        let first = digits.iter().position(|&d| d != 0).unwrap_or(digits.len() - 1);
        let digits = &digits[first..];
        let significand_digits = digits.len() as i64;
        let scientific_exponent = significand_digits - 1 + exponent;

        let push_digits = |out: &mut String, digits: &[u8]| {
            out.extend(digits.iter().map(|&d| char::from(b'0' + d)));
        };

        if scientific_exponent >= 34 || scientific_exponent <= -7 || exponent > 0 {
            push_digits(&mut out, &digits[..1]);
            if digits.len() > 1 {
                out.push('.');
                push_digits(&mut out, &digits[1..]);
            }
            out.push('E');
            if scientific_exponent > 0 {
                out.push('+');
            }
            out.push_str(&scientific_exponent.to_string());
        } else if exponent >= 0 {
            push_digits(&mut out, digits);
        } else {
            let radix_position = significand_digits + exponent;
            if radix_position > 0 {
                let (whole, fraction) = digits.split_at(radix_position as usize);
                push_digits(&mut out, whole);
                out.push('.');
                push_digits(&mut out, fraction);
            } else {
                out.push_str("0.");
                out.extend(std::iter::repeat_n('0', radix_position.unsigned_abs() as usize));
                push_digits(&mut out, digits);
            }
        }

        out
    }
}

/// The full 128-bit product of two 64-bit values.
fn multiply_64x2(left: u64, right: u64) -> u128 {
    left as u128 * right as u128
}

struct DecimalShape {
    mantissa: bool,
    exponent_marker: bool,
}

/// Recognizes `[+-]? (digits | digits? '.' digits?)? [eE]? [+-]? digits?`, the widest shape that
/// is accepted as an attempt at a decimal number.
fn scan_decimal_shape(input: &[u8]) -> Option<DecimalShape> {
    let is_digit = |i: usize| input.get(i).is_some_and(u8::is_ascii_digit);
    let mut i = 0;

    if matches!(input.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let mantissa_start = i;
    while is_digit(i) {
        i += 1;
    }
    if input.get(i) == Some(&b'.') {
        i += 1;
        while is_digit(i) {
            i += 1;
        }
    }
    let mantissa = i > mantissa_start;

    let exponent_marker = matches!(input.get(i), Some(b'e' | b'E'));
    if exponent_marker {
        i += 1;
    }
    if matches!(input.get(i), Some(b'+' | b'-')) {
        i += 1;
    }
    while is_digit(i) {
        i += 1;
    }

    (i == input.len()).then_some(DecimalShape {
        mantissa,
        exponent_marker,
    })
}

fn strip_sign(input: &[u8]) -> &[u8] {
    match input.first() {
        Some(b'+' | b'-') => &input[1..],
        _ => input,
    }
}

fn is_infinity_literal(input: &[u8]) -> bool {
    let body = strip_sign(input);
    body.eq_ignore_ascii_case(b"infinity") || body.eq_ignore_ascii_case(b"inf")
}

fn is_nan_literal(input: &[u8]) -> bool {
    strip_sign(input).eq_ignore_ascii_case(b"nan")
}

impl fmt::Debug for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal128({})", self.format())
    }
}

impl fmt::Display for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl FromStr for Decimal128 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl From<[u8; 16]> for Decimal128 {
    fn from(bytes: [u8; 16]) -> Self {
        Self::from_bytes(bytes)
    }
}
