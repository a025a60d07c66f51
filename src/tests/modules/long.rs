use crate::Long;
use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use std::cmp::Ordering;

#[test]
fn arithmetic_wraps_like_i64() {
    let cases = [
        (0i64, 0i64),
        (1, -1),
        (i64::MAX, 1),
        (i64::MIN, -1),
        (123_456_789_012, -987_654_321),
        (0x7fff_ffff, 0x7fff_ffff),
    ];
    for (a, b) in cases {
        let (la, lb) = (Long::from_i64(a), Long::from_i64(b));
        assert_eq!(la.add(lb).as_i64(), a.wrapping_add(b), "{a} + {b}");
        assert_eq!(la.sub(lb).as_i64(), a.wrapping_sub(b), "{a} - {b}");
        assert_eq!(la.mul(lb).as_i64(), a.wrapping_mul(b), "{a} * {b}");
        assert_eq!((la & lb).as_i64(), a & b);
        assert_eq!((la | lb).as_i64(), a | b);
        assert_eq!((la ^ lb).as_i64(), a ^ b);
    }
}

#[test]
fn operators_match_methods() {
    let a = Long::from_i64(40);
    let b = Long::from_i64(2);
    assert_eq!(a + b, Long::from_i64(42));
    assert_eq!(a - b, Long::from_i64(38));
    assert_eq!(a * b, Long::from_i64(80));
    assert_eq!(-a, Long::from_i64(-40));
    assert_eq!(!Long::ZERO, Long::NEG_ONE);
    assert_eq!(b << 4, Long::from_i64(32));
    assert_eq!(Long::from_i64(-32) >> 4, Long::from_i64(-2));
}

#[test]
fn division() {
    let div = |a: i64, b: i64| Long::from_i64(a).div(Long::from_i64(b)).map(Long::as_i64);
    let rem = |a: i64, b: i64| Long::from_i64(a).rem(Long::from_i64(b)).map(Long::as_i64);

    assert_eq!(div(7, 2).unwrap(), 3);
    assert_eq!(div(7, -2).unwrap(), -3);
    assert_eq!(div(-7, 2).unwrap(), -3);
    assert_eq!(rem(-7, 2).unwrap(), -1);
    assert_eq!(rem(7, -2).unwrap(), 1);
    assert_eq!(div(i64::MIN, -1).unwrap(), i64::MIN);
    assert_eq!(rem(i64::MIN, -1).unwrap(), 0);

    let err = Long::ONE.div(Long::ZERO).unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(Long::ONE.rem(Long::ZERO).is_err());
}

#[test]
fn unsigned_division() {
    let max = Long::MAX_UNSIGNED_VALUE;
    let two = Long::from_u64(2);
    assert_eq!(max.div(two).unwrap().as_u64(), u64::MAX / 2);
    assert_eq!(max.rem(two).unwrap().as_u64(), 1);
}

#[test]
fn shifts() {
    let neg = Long::from_i64(-8);
    assert_eq!(neg.shr(1).as_i64(), -4);
    assert_eq!(neg.shru(60).as_i64(), 15);
    assert_eq!(Long::ONE.shl(63), Long::MIN_VALUE);
    // shift counts are taken modulo 64
    assert_eq!(Long::ONE.shl(64), Long::ONE);
    assert_eq!(Long::NEG_ONE.shru(64), Long::NEG_ONE);
}

#[test]
fn halves() {
    let value = Long::from_bits(-1, 0x7fff_ffff, false);
    assert_eq!(value, Long::MAX_VALUE);
    assert_eq!(value.low_bits(), -1);
    assert_eq!(value.high_bits(), 0x7fff_ffff);

    let min = Long::MIN_VALUE;
    assert_eq!(min.low_bits(), 0);
    assert_eq!(min.high_bits(), i32::MIN);
}

#[test]
fn from_f64_saturates() {
    assert_eq!(Long::from_f64(f64::NAN, false), Long::ZERO);
    assert_eq!(Long::from_f64(3.7, false), Long::from_i64(3));
    assert_eq!(Long::from_f64(-3.7, false), Long::from_i64(-3));
    assert_eq!(Long::from_f64(1e30, false), Long::MAX_VALUE);
    assert_eq!(Long::from_f64(-1e30, false), Long::MIN_VALUE);
    assert_eq!(Long::from_f64(-1.0, true), Long::UZERO);
    assert_eq!(Long::from_f64(1e30, true), Long::MAX_UNSIGNED_VALUE);
    assert_eq!(
        Long::from_f64(9_223_372_036_854_775_808.0, true).as_u64(),
        1 << 63
    );
}

#[test]
fn to_f64() {
    assert_eq!(Long::from_i64(-12).to_f64(), -12.0);
    assert_eq!(Long::MAX_UNSIGNED_VALUE.to_f64(), u64::MAX as f64);
    assert_eq!(Long::from_i64(1 << 53).to_f64(), 9_007_199_254_740_992.0);
}

#[test]
fn parse() {
    assert_eq!(Long::from_str_radix("ff", false, 16).unwrap(), Long::from_i64(255));
    assert_eq!(Long::from_str_radix("-101", false, 2).unwrap(), Long::from_i64(-5));
    assert_eq!(
        "-9223372036854775808".parse::<Long>().unwrap(),
        Long::MIN_VALUE
    );
    assert_eq!(
        Long::from_str_radix("18446744073709551615", true, 10).unwrap(),
        Long::MAX_UNSIGNED_VALUE
    );
    assert_eq!(Long::from_str_radix("NaN", false, 10).unwrap(), Long::ZERO);
    assert_eq!(Long::from_str_radix("-Infinity", false, 10).unwrap(), Long::ZERO);

    assert_matches!(Long::from_str_radix("1-2", false, 10), Err(e) if e.is_number_format());
    assert_matches!(Long::from_str_radix("12z", false, 10), Err(e) if e.is_number_format());
    assert_matches!(Long::from_str_radix("", false, 10), Err(e) if e.is_number_format());
    assert_matches!(Long::from_str_radix("1", false, 1), Err(e) if e.is_invalid_argument());
    assert_matches!(Long::from_str_radix("1", false, 37), Err(e) if e.is_invalid_argument());
}

#[test]
fn render() {
    assert_eq!(Long::from_i64(-255).to_string_radix(16).unwrap(), "-ff");
    assert_eq!(Long::from_i64(5).to_string_radix(2).unwrap(), "101");
    assert_eq!(Long::ZERO.to_string_radix(36).unwrap(), "0");
    assert_eq!(
        Long::MIN_VALUE.to_string_radix(10).unwrap(),
        "-9223372036854775808"
    );
    assert_eq!(
        Long::MAX_UNSIGNED_VALUE.to_string_radix(16).unwrap(),
        "ffffffffffffffff"
    );
    assert!(Long::ONE.to_string_radix(40).is_err());

    assert_eq!(Long::MAX_UNSIGNED_VALUE.to_string(), "18446744073709551615");
    assert_eq!(Long::NEG_ONE.to_string(), "-1");
    assert_eq!(format!("{:?}", Long::from_u64(5)), "Long(5u)");
    assert_eq!(format!("{:?}", Long::from_i64(-5)), "Long(-5)");
}

#[test]
fn signedness() {
    let all_ones_signed = Long::NEG_ONE;
    let all_ones_unsigned = Long::MAX_UNSIGNED_VALUE;
    assert!(all_ones_signed.is_negative());
    assert!(!all_ones_unsigned.is_negative());
    assert!(!all_ones_signed.equals(all_ones_unsigned));
    assert_eq!(all_ones_signed.to_unsigned(), all_ones_unsigned);
    assert_eq!(all_ones_unsigned.to_signed(), all_ones_signed);

    // without the top bit set the representations agree
    assert!(Long::from_i64(7).equals(Long::from_u64(7)));
}

#[test]
fn ordering() {
    assert_eq!(Long::NEG_ONE.compare(Long::ZERO), Ordering::Less);
    assert_eq!(Long::MAX_VALUE.compare(Long::MIN_VALUE), Ordering::Greater);
    assert_eq!(Long::from_i64(3).compare(Long::from_i64(3)), Ordering::Equal);
    assert_eq!(
        Long::MAX_UNSIGNED_VALUE.compare(Long::UZERO),
        Ordering::Greater
    );
    assert!(Long::from_u64(1 << 63) > Long::from_u64(1));
    assert!(Long::MIN_VALUE < Long::from_i64(-1));
}

#[test]
fn predicates() {
    assert!(Long::ZERO.is_zero());
    assert!(Long::UZERO.is_zero());
    assert!(Long::from_i64(-3).is_odd());
    assert!(!Long::from_i64(4).is_odd());
    assert!(Long::UONE.is_unsigned());
    assert!(!Long::ONE.is_unsigned());
}
